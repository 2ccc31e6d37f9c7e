use std::error::Error;

use grid_mdp::{
    agent::{Agent, RandomAgent},
    gym::{grid_world::Grid, GridWorld},
};

const NUM_EPISODES: u32 = 10;

fn main() -> Result<(), Box<dyn Error>> {
    let grid = Grid::try_from([[0, 0, 0, 1], [0, 9, 0, -1], [0, 0, 0, 0]])?;
    let mut env = GridWorld::new(grid)?;
    let mut agent = RandomAgent::new();

    for i in 0..NUM_EPISODES {
        let episode = agent.go(&mut env);
        let report = env.report.take();

        println!(
            "Episode {}: Agent at state {} took action {:?} and got {} reward in {} steps.",
            i, episode.final_state, episode.last_action, episode.total_reward, report["steps"]
        );
    }

    Ok(())
}
