use async_trait::async_trait;
use derive_more::{Display, Error, From};
use lib::rig::Action;
use std::{io, time::Duration};
use tokio::time::timeout;
use tracing::{debug, instrument};

mod gcode;

pub use gcode::*;

/// The reason why the motion controller could not perform an [`Action`].
#[derive(Debug, Display, Error, From)]
pub enum ControllerError {
    /// The controller acknowledged the action with an error or alarm.
    #[display(fmt = "the motion controller reported `{}`", _0)]
    Fault(#[error(not(source))] String),

    /// The link to the controller is broken.
    #[display(fmt = "the link to the motion controller is unavailable")]
    Unavailable(io::Error),
}

/// Trait for devices that perform physical [`Action`]s.
#[async_trait]
#[cfg_attr(test, mockall::automock)]
pub trait Controller {
    /// Homes the gantry and zeroes the machine plane.
    async fn home(&mut self) -> Result<(), ControllerError>;

    /// Performs a single action to completion.
    async fn act(&mut self, action: Action) -> Result<(), ControllerError>;
}

/// The reason why a sequence of [`Action`]s was not performed to completion.
#[derive(Debug, Display, Error, From)]
pub enum MotionError {
    /// The controller did not confirm completion within the configured window.
    #[display(fmt = "the motion controller did not confirm within {}ms", "_0.as_millis()")]
    Timeout(#[error(not(source))] Duration),

    Controller(ControllerError),
}

/// The exclusive channel to the motion controller.
///
/// The `&mut` borrow taken by [`Channel::execute`] spans the whole sequence,
/// so nothing else can reach the controller while actions are in flight.
#[derive(Debug)]
pub struct Channel<T> {
    controller: T,
    timeout: Duration,
}

impl<T: Controller + Send> Channel<T> {
    /// Constructs a channel with the given per-action confirmation window.
    pub fn new(controller: T, timeout: Duration) -> Self {
        Channel {
            controller,
            timeout,
        }
    }

    /// Homes the gantry before the first move.
    #[instrument(level = "debug", skip(self), err)]
    pub async fn home(&mut self) -> Result<(), MotionError> {
        match timeout(self.timeout, self.controller.home()).await {
            Err(_) => Err(MotionError::Timeout(self.timeout)),
            Ok(r) => Ok(r?),
        }
    }

    /// Performs actions strictly in order, confirming each before dispatching
    /// the next.
    ///
    /// The sequence is abandoned at the first failure; actions already
    /// performed are not undone.
    #[instrument(level = "debug", skip_all, err, fields(actions = actions.len()))]
    pub async fn execute(&mut self, actions: &[Action]) -> Result<(), MotionError> {
        for &action in actions {
            debug!(%action);

            match timeout(self.timeout, self.controller.act(action)).await {
                Err(_) => return Err(MotionError::Timeout(self.timeout)),
                Ok(r) => r?,
            }
        }

        Ok(())
    }
}
