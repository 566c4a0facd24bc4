//! Target Rush headless demo
//!
//! Plays scripted rounds on a simulated clock against the in-memory
//! leaderboard. Usage: `target-rush [settings.json]`

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    log::info!("Target Rush starting...");

    if let Err(e) = demo::run(std::env::args().nth(1)) {
        log::error!("{}", e);
        std::process::exit(1);
    }
}

mod demo {
    use std::error::Error;
    use std::rc::Rc;
    use std::time::Duration;

    use futures::executor::block_on;

    use target_rush::sim::{ManualScheduler, Viewport};
    use target_rush::{Game, MemoryLeaderboard, PresentationEvent, Settings};

    /// Phone-sized portrait screen
    const VIEWPORT: Viewport = Viewport {
        width: 390.0,
        height: 844.0,
    };

    const ROUNDS: u32 = 3;

    pub fn run(settings_path: Option<String>) -> Result<(), Box<dyn Error>> {
        let settings = match settings_path {
            Some(path) => Settings::load(path)?,
            None => Settings::default(),
        };

        let gateway = Rc::new(MemoryLeaderboard::new());
        let mut game = Game::new(&settings, VIEWPORT, ManualScheduler::new(), Rc::clone(&gateway))?;
        let step = settings.countdown_interval();

        for round in 1..=ROUNDS {
            if round > 1 {
                game.handle(PresentationEvent::RestartRequested)?;
            }
            play_round(&mut game, step, round)?;

            block_on(game.settle());
            let view = game.view();
            log::info!("Round {} final score: {}", round, view.score);
            if game.session().leaderboard().top_score() == Some(view.score) {
                log::info!("  New best!");
            }
            for (rank, score) in view.leaderboard.iter().enumerate() {
                log::info!("  {}. {}", rank + 1, score);
            }
        }

        log::info!("{} scores stored", gateway.records().len());
        Ok(())
    }

    /// Advance one countdown step at a time, tapping a few times per step
    fn play_round(
        game: &mut Game<ManualScheduler, MemoryLeaderboard>,
        step: Duration,
        round: u32,
    ) -> Result<(), Box<dyn Error>> {
        let mut second = 0u32;
        while game.session().is_running() {
            let taps = (second + round) % 3;
            for _ in 0..taps {
                game.handle(PresentationEvent::Tap)?;
            }
            game.session_mut().scheduler_mut().advance(step);
            game.update()?;
            second += 1;
        }
        Ok(())
    }
}
