use std::error::Error;

use grid_mdp::algo::{History, HistoryGame};

fn main() -> Result<(), Box<dyn Error>> {
    let game = HistoryGame::default();

    for label in [
        "happy_end",
        "bad_end",
        "state",
        "state_up_up",
        "state_down_down",
        "state_up_up_up_up_up",
        "state_down_down_down_down_down",
    ] {
        let state: History = label.parse()?;
        println!("V({state}) = {}", game.value(&state));
    }

    Ok(())
}
