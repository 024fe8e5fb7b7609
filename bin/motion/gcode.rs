use super::{Controller, ControllerError};
use crate::io::Io;
use async_trait::async_trait;
use derive_more::Constructor;
use lib::rig::{Action, Geometry, Point, Target};
use tracing::{debug, instrument};

/// Drives a GRBL-style motion controller with G-code over an [`Io`] link.
///
/// Every line is acknowledged with `ok`; completion of a motion is confirmed
/// by polling the status report until the controller goes idle.
#[derive(Debug, Constructor)]
pub struct Gcode<T: Io> {
    io: T,
    geometry: Geometry,
    slots: Vec<Point>,
}

impl<T: Io + Send> Gcode<T> {
    fn target(&self, target: Target) -> Result<Point, ControllerError> {
        match target {
            Target::Square(sq) => Ok(self.geometry.point(sq)),

            Target::Slot(slot) => match self.slots.get(slot.get()) {
                Some(p) => Ok(*p),
                None => Err(ControllerError::Fault(format!(
                    "no location is configured for the storage slot {slot}"
                ))),
            },
        }
    }

    async fn exec(&mut self, line: &str) -> Result<(), ControllerError> {
        self.io.send(line).await?;
        self.io.flush().await?;

        loop {
            let reply = self.io.recv().await?;
            let reply = reply.trim();

            if reply == "ok" {
                break Ok(());
            } else if reply.starts_with("error") || reply.starts_with("ALARM") {
                break Err(ControllerError::Fault(reply.to_string()));
            } else if !reply.is_empty() {
                debug!(%reply);
            }
        }
    }

    /// Polls the status report until the controller goes idle.
    async fn idle(&mut self) -> Result<(), ControllerError> {
        loop {
            self.io.send("?").await?;
            self.io.flush().await?;

            let reply = self.io.recv().await?;

            if reply.contains("Idle") {
                break Ok(());
            } else if reply.contains("ALARM") || reply.contains("Alarm") {
                break Err(ControllerError::Fault(reply.trim().to_string()));
            }
        }
    }

    async fn travel(&mut self, p: Point) -> Result<(), ControllerError> {
        self.exec(&format!("G0 X{:.3} Y{:.3}", p.x, p.y)).await?;
        self.idle().await
    }

    async fn carry(&mut self, p: Point) -> Result<(), ControllerError> {
        self.exec(&format!("G1 X{:.3} Y{:.3} F150", p.x, p.y)).await?;
        self.idle().await
    }
}

#[async_trait]
impl<T: Io + Send> Controller for Gcode<T> {
    #[instrument(level = "debug", skip(self), err)]
    async fn home(&mut self) -> Result<(), ControllerError> {
        self.exec("$H").await?;
        self.exec("G92 X0 Y0").await?;
        self.exec("G21 G90").await
    }

    #[instrument(level = "debug", skip(self), err)]
    async fn act(&mut self, action: Action) -> Result<(), ControllerError> {
        match action {
            Action::Engage(sq) => {
                self.travel(self.geometry.point(sq)).await?;
                self.exec("servo_up").await
            }

            Action::Disengage(target) => {
                self.carry(self.target(target)?).await?;
                self.exec("servo_down").await
            }

            Action::Travel(p) => self.travel(p).await,
        }
    }
}
