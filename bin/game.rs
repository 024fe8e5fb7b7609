use crate::motion::{Channel, Controller, MotionError};
use crate::player::Player;
use derive_more::{Display, Error};
use lib::rig::{Plan, Slots, SlotsExhausted};
use shakmaty as sm;
use sm::{san::SanPlus, uci::Uci, CastlingMode, Chess, Color, Move, Outcome, Position, Square};
use tracing::{field::display, instrument, warn, Span};

/// The reason why the game was interrupted.
#[derive(Debug, Display, Error)]
pub enum GameInterrupted<W, B> {
    #[display(fmt = "the white player encountered an error")]
    White(W),

    #[display(fmt = "the black player encountered an error")]
    Black(B),

    /// A non-interactive player proposed a move the rules reject.
    #[display(
        fmt = "the {} player proposed the illegal move `{}`",
        "if *_0 == Color::White { \"white\" } else { \"black\" }",
        _1
    )]
    Illegal(#[error(not(source))] Color, #[error(not(source))] Uci),

    /// No storage slot is left for the captured piece.
    Storage(SlotsExhausted),

    /// Physical execution of a move failed midway.
    ///
    /// The board may no longer match the logical position and must be
    /// reconciled by the operator before play resumes.
    #[display(fmt = "execution of `{}` stalled", _0)]
    Stalled(#[error(not(source))] Uci, #[error(source)] MotionError),

    /// The game is paused on an earlier failure pending [`Game::resume`].
    #[display(fmt = "the game is paused on the stalled move `{}`", _0)]
    Suspended(#[error(not(source))] Uci),
}

/// Holds the state of a game of chess played on the physical board.
pub struct Game<W, B, T: Controller> {
    white: W,
    black: B,
    channel: Channel<T>,
    pos: Chess,
    slots: Slots,
    record: Vec<SanPlus>,
    stalled: Option<Uci>,
}

impl<W, B, T> Game<W, B, T>
where
    W: Player + Send,
    B: Player + Send,
    T: Controller + Send,
{
    /// Sets up a game from the given position.
    pub fn new(white: W, black: B, channel: Channel<T>, slots: Slots, pos: Chess) -> Self {
        Game {
            white,
            black,
            channel,
            pos,
            slots,
            record: Vec::new(),
            stalled: None,
        }
    }

    /// The position according to the rules engine.
    pub fn position(&self) -> &Chess {
        &self.pos
    }

    /// The moves played so far, in standard algebraic notation.
    pub fn record(&self) -> &[SanPlus] {
        &self.record
    }

    /// The storage pool for captured pieces.
    pub fn slots(&self) -> &Slots {
        &self.slots
    }

    /// The move whose physical execution failed, if the game is paused.
    pub fn stalled(&self) -> Option<&Uci> {
        self.stalled.as_ref()
    }

    /// Confirms that the operator has reconciled the physical board with the
    /// logical position, unpausing the game.
    pub fn resume(&mut self) {
        self.stalled = None;
    }

    /// The piece this move removes from the board, if any.
    fn victim(&self, m: &Move) -> Option<sm::Piece> {
        match *m {
            Move::EnPassant { from, to } => self
                .pos
                .board()
                .piece_at(Square::from_coords(to.file(), from.rank())),

            Move::Normal { to, .. } => self.pos.board().piece_at(to),

            _ => None,
        }
    }

    /// Plays the game out until it ends or is interrupted.
    ///
    /// One turn goes through asking the player for a move, validating it
    /// against the rules, compiling it to actions, executing those on the
    /// board and only then applying the move to the logical position. Any
    /// motion failure pauses the game with the board untouched logically.
    #[instrument(level = "debug", skip(self), err, fields(outcome))]
    pub async fn play(&mut self) -> Result<Outcome, GameInterrupted<W::Error, B::Error>> {
        use GameInterrupted::*;

        loop {
            if let Some(m) = &self.stalled {
                return Err(Suspended(m.clone()));
            }

            if let Some(o) = self.pos.outcome() {
                Span::current().record("outcome", display(o));
                break Ok(o);
            }

            let turn = self.pos.turn();

            let uci = match turn {
                Color::White => self.white.play(&self.pos).await.map_err(White)?,
                Color::Black => self.black.play(&self.pos).await.map_err(Black)?,
            };

            let m = match uci.to_move(&self.pos) {
                Ok(m) => m,

                Err(_) => {
                    let interactive = match turn {
                        Color::White => self.white.interactive(),
                        Color::Black => self.black.interactive(),
                    };

                    if interactive {
                        warn!(%uci, "the proposed move is illegal, asking again");
                        continue;
                    }

                    return Err(Illegal(turn, uci));
                }
            };

            let plan = Plan::compile(&m, self.pos.board(), &self.slots).map_err(Storage)?;

            if let Err(e) = self.channel.execute(&plan).await {
                let uci = m.to_uci(CastlingMode::Standard);
                self.stalled = Some(uci.clone());
                return Err(Stalled(uci, e));
            }

            if let Some(victim) = self.victim(&m) {
                self.slots.put(victim).map_err(Storage)?;
            }

            let san = SanPlus::from_move_and_play_unchecked(&mut self.pos, &m);
            self.record.push(san);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::motion::{ControllerError, MockController};
    use crate::player::MockPlayer;
    use lib::rig::{Action, Point, Slot};
    use mockall::Sequence;
    use shakmaty::fen::Fen;
    use shakmaty::Role;
    use std::future::ready;
    use std::time::Duration;
    use test_strategy::proptest;
    use tokio::runtime;

    fn pool(n: usize) -> Slots {
        Slots::new((0..n).map(|i| Point::new(-100., i as f64 * 25.)).collect())
    }

    fn channel(controller: MockController) -> Channel<MockController> {
        Channel::new(controller, Duration::from_secs(1))
    }

    fn position(fen: &str) -> Chess {
        fen.parse::<Fen>()
            .unwrap()
            .into_position(CastlingMode::Standard)
            .unwrap()
    }

    fn plays(player: &mut MockPlayer, uci: &'static str) {
        player.expect_play().once().returning(move |_| {
            Box::pin(ready(Ok(uci.parse().unwrap())))
        });
    }

    fn fails(player: &mut MockPlayer, e: &str) {
        let e = e.to_string();
        player
            .expect_play()
            .once()
            .return_once(move |_| Box::pin(ready(Err(e))));
    }

    #[proptest]
    fn game_ends_when_the_position_is_decided() {
        let rt = runtime::Builder::new_multi_thread().enable_time().build()?;

        let pos = position("4k3/4Q3/4K3/8/8/8/8/8 b - - 0 1");
        let outcome = pos.outcome().unwrap();

        let mut game = Game::new(
            MockPlayer::new(),
            MockPlayer::new(),
            channel(MockController::new()),
            pool(2),
            pos,
        );

        assert!(matches!(rt.block_on(game.play()), Ok(o) if o == outcome));
        assert!(game.record().is_empty());
    }

    #[proptest]
    fn turn_is_executed_on_the_board_before_the_position_advances() {
        let rt = runtime::Builder::new_multi_thread().enable_time().build()?;

        let mut white = MockPlayer::new();
        let mut black = MockPlayer::new();

        plays(&mut white, "e2e4");
        fails(&mut black, "stop");

        let mut controller = MockController::new();
        let mut seq = Sequence::new();

        for action in [
            Action::Engage(Square::E2),
            Action::Disengage(Square::E4.into()),
        ] {
            controller
                .expect_act()
                .once()
                .in_sequence(&mut seq)
                .withf(move |a| *a == action)
                .returning(|_| Box::pin(ready(Ok(()))));
        }

        let mut game = Game::new(white, black, channel(controller), pool(2), Chess::default());

        assert!(matches!(
            rt.block_on(game.play()),
            Err(GameInterrupted::Black(e)) if e == "stop"
        ));

        assert_eq!(game.position().board().piece_at(Square::E2), None);
        assert_eq!(
            game.position().board().piece_at(Square::E4).map(|p| p.role),
            Some(Role::Pawn)
        );

        assert_eq!(game.record().len(), 1);
        assert_eq!(game.record()[0].to_string(), "e4");
        assert!(game.slots().is_empty());
    }

    #[proptest]
    fn captured_piece_is_parked_in_the_first_free_slot() {
        let rt = runtime::Builder::new_multi_thread().enable_time().build()?;

        let mut white = MockPlayer::new();
        let mut black = MockPlayer::new();

        plays(&mut white, "e4d5");
        fails(&mut black, "stop");

        let mut controller = MockController::new();
        controller
            .expect_act()
            .times(4)
            .returning(|_| Box::pin(ready(Ok(()))));

        let pos = position("4k3/8/8/3p4/4P3/8/8/4K3 w - - 0 1");
        let mut game = Game::new(white, black, channel(controller), pool(2), pos);

        assert!(matches!(
            rt.block_on(game.play()),
            Err(GameInterrupted::Black(_))
        ));

        assert_eq!(game.slots().len(), 1);

        assert_eq!(
            game.slots().piece(Slot::new(0)).map(|p| (p.color, p.role)),
            Some((Color::Black, Role::Pawn))
        );
    }

    #[proptest]
    fn motion_failure_pauses_the_game_without_advancing_the_position(fault: String) {
        let rt = runtime::Builder::new_multi_thread().enable_time().build()?;

        let mut white = MockPlayer::new();
        plays(&mut white, "e4d5");

        let mut controller = MockController::new();
        let mut seq = Sequence::new();

        controller
            .expect_act()
            .once()
            .in_sequence(&mut seq)
            .returning(|_| Box::pin(ready(Ok(()))));

        let e = fault.clone();
        controller
            .expect_act()
            .once()
            .in_sequence(&mut seq)
            .return_once(move |_| Box::pin(ready(Err(ControllerError::Fault(e)))));

        let pos = position("4k3/8/8/3p4/4P3/8/8/4K3 w - - 0 1");

        let mut game = Game::new(
            white,
            MockPlayer::new(),
            channel(controller),
            pool(2),
            pos,
        );

        assert!(matches!(
            rt.block_on(game.play()),
            Err(GameInterrupted::Stalled(m, MotionError::Controller(_)))
                if m == "e4d5".parse::<Uci>()?
        ));

        // the logical position was not advanced
        assert_eq!(
            game.position().board().piece_at(Square::E4).map(|p| p.role),
            Some(Role::Pawn)
        );

        assert_eq!(
            game.position().board().piece_at(Square::D5).map(|p| p.role),
            Some(Role::Pawn)
        );

        assert_eq!(game.position().turn(), Color::White);
        assert!(game.slots().is_empty());
        assert!(game.record().is_empty());
        assert_eq!(game.stalled(), Some(&"e4d5".parse::<Uci>()?));
    }

    #[proptest]
    fn paused_game_refuses_to_play_until_resumed() {
        let rt = runtime::Builder::new_multi_thread().enable_time().build()?;

        let mut white = MockPlayer::new();
        plays(&mut white, "e2e4");

        let mut controller = MockController::new();
        controller
            .expect_act()
            .once()
            .return_once(|_| Box::pin(ready(Err(ControllerError::Fault("jam".to_string())))));

        let mut game = Game::new(
            white,
            MockPlayer::new(),
            channel(controller),
            pool(2),
            Chess::default(),
        );

        assert!(matches!(
            rt.block_on(game.play()),
            Err(GameInterrupted::Stalled(..))
        ));

        assert!(matches!(
            rt.block_on(game.play()),
            Err(GameInterrupted::Suspended(m)) if m == "e2e4".parse::<Uci>()?
        ));

        game.resume();
        assert_eq!(game.stalled(), None);
    }

    #[proptest]
    fn illegal_move_from_a_non_interactive_player_interrupts_the_game() {
        let rt = runtime::Builder::new_multi_thread().enable_time().build()?;

        let mut white = MockPlayer::new();
        plays(&mut white, "e2e5");
        white.expect_interactive().return_const(false);

        let mut game = Game::new(
            white,
            MockPlayer::new(),
            channel(MockController::new()),
            pool(2),
            Chess::default(),
        );

        assert!(matches!(
            rt.block_on(game.play()),
            Err(GameInterrupted::Illegal(Color::White, m)) if m == "e2e5".parse::<Uci>()?
        ));
    }

    #[proptest]
    fn illegal_move_from_an_interactive_player_is_requested_again() {
        let rt = runtime::Builder::new_multi_thread().enable_time().build()?;

        let mut white = MockPlayer::new();
        let mut black = MockPlayer::new();
        let mut seq = Sequence::new();

        white
            .expect_play()
            .once()
            .in_sequence(&mut seq)
            .returning(|_| Box::pin(ready(Ok("e2e5".parse().unwrap()))));

        white
            .expect_play()
            .once()
            .in_sequence(&mut seq)
            .returning(|_| Box::pin(ready(Ok("e2e4".parse().unwrap()))));

        white.expect_interactive().return_const(true);
        fails(&mut black, "stop");

        let mut controller = MockController::new();
        controller
            .expect_act()
            .times(2)
            .returning(|_| Box::pin(ready(Ok(()))));

        let mut game = Game::new(white, black, channel(controller), pool(2), Chess::default());

        assert!(matches!(
            rt.block_on(game.play()),
            Err(GameInterrupted::Black(_))
        ));

        assert_eq!(game.record().len(), 1);
    }

    #[proptest]
    fn exhausted_storage_interrupts_the_game() {
        let rt = runtime::Builder::new_multi_thread().enable_time().build()?;

        let mut white = MockPlayer::new();
        plays(&mut white, "e4d5");

        let pos = position("4k3/8/8/3p4/4P3/8/8/4K3 w - - 0 1");

        let mut game = Game::new(
            white,
            MockPlayer::new(),
            channel(MockController::new()),
            pool(0),
            pos,
        );

        assert!(matches!(
            rt.block_on(game.play()),
            Err(GameInterrupted::Storage(SlotsExhausted(0)))
        ));
    }

    #[proptest]
    fn en_passant_parks_the_pawn_behind_the_destination() {
        let rt = runtime::Builder::new_multi_thread().enable_time().build()?;

        let mut white = MockPlayer::new();
        let mut black = MockPlayer::new();

        plays(&mut white, "e5d6");
        fails(&mut black, "stop");

        let mut controller = MockController::new();
        let mut seq = Sequence::new();

        for action in [
            Action::Engage(Square::D5),
            Action::Disengage(Slot::new(0).into()),
            Action::Engage(Square::E5),
            Action::Disengage(Square::D6.into()),
        ] {
            controller
                .expect_act()
                .once()
                .in_sequence(&mut seq)
                .withf(move |a| *a == action)
                .returning(|_| Box::pin(ready(Ok(()))));
        }

        let pos = position("4k3/8/8/3pP3/8/8/8/4K3 w - d6 0 2");
        let mut game = Game::new(white, black, channel(controller), pool(2), pos);

        assert!(matches!(
            rt.block_on(game.play()),
            Err(GameInterrupted::Black(_))
        ));

        assert_eq!(
            game.slots().piece(Slot::new(0)).map(|p| (p.color, p.role)),
            Some((Color::Black, Role::Pawn))
        );

        assert_eq!(game.position().board().piece_at(Square::D5), None);
    }

    #[proptest]
    fn castling_is_executed_king_first() {
        let rt = runtime::Builder::new_multi_thread().enable_time().build()?;

        let mut white = MockPlayer::new();
        let mut black = MockPlayer::new();

        plays(&mut white, "e1g1");
        fails(&mut black, "stop");

        let mut controller = MockController::new();
        let mut seq = Sequence::new();

        for action in [
            Action::Engage(Square::E1),
            Action::Disengage(Square::G1.into()),
            Action::Engage(Square::H1),
            Action::Disengage(Square::F1.into()),
        ] {
            controller
                .expect_act()
                .once()
                .in_sequence(&mut seq)
                .withf(move |a| *a == action)
                .returning(|_| Box::pin(ready(Ok(()))));
        }

        let pos = position("4k3/8/8/8/8/8/8/4K2R w K - 0 1");
        let mut game = Game::new(white, black, channel(controller), pool(2), pos);

        assert!(matches!(
            rt.block_on(game.play()),
            Err(GameInterrupted::Black(_))
        ));

        assert_eq!(
            game.position().board().piece_at(Square::G1).map(|p| p.role),
            Some(Role::King)
        );

        assert_eq!(
            game.position().board().piece_at(Square::F1).map(|p| p.role),
            Some(Role::Rook)
        );
    }
}
