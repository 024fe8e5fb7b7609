use crate::build::Build;
use crate::game::Game;
use crate::io::Process;
use crate::motion::{Channel, Gcode};
use crate::player::PlayerConfig;
use anyhow::{Context, Error as Anyhow};
use clap::Parser;
use lib::rig::{RigConfig, Slots};
use shakmaty::Chess;
use tracing::{info, instrument};

/// A game of chess on the physical board.
#[derive(Debug, Parser)]
pub struct Play {
    /// The white player.
    #[clap(short, long, default_value_t)]
    white: PlayerConfig,

    /// The black player.
    #[clap(short, long, default_value_t)]
    black: PlayerConfig,

    /// The physical layout and timing of the rig.
    #[clap(short, long, default_value_t)]
    rig: RigConfig,

    /// The firmware bridge executable that owns the serial link.
    #[clap(short = 'm', long, default_value = "grbl-bridge")]
    bridge: String,
}

impl Play {
    #[instrument(level = "trace", skip(self), err)]
    pub async fn execute(self) -> Result<(), Anyhow> {
        let io = Process::spawn(&self.bridge).context("failed to spawn the firmware bridge")?;
        let gcode = Gcode::new(io, self.rig.geometry(), self.rig.slots.clone());

        let mut channel = Channel::new(gcode, self.rig.timeout);
        channel.home().await.context("failed to home the gantry")?;

        let slots = Slots::new(self.rig.slots);
        let white = self.white.build()?;
        let black = self.black.build()?;

        let mut game = Game::new(white, black, channel, slots, Chess::default());
        let outcome = game.play().await.context("the game was interrupted")?;

        info!(%outcome, moves = game.record().len(), captures = game.slots().len());

        let record = game
            .record()
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join(" ");

        println!("{record}");
        println!("{outcome}");

        Ok(())
    }
}
