//! Chess position representation.

use chess_core::{Color, Fen, FenError, Piece, PieceKind, Square};

use crate::Board;

/// Castling rights flags.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct CastlingRights(u8);

impl CastlingRights {
    pub const NONE: CastlingRights = CastlingRights(0);
    pub const WHITE_KINGSIDE: u8 = 0b0001;
    pub const WHITE_QUEENSIDE: u8 = 0b0010;
    pub const BLACK_KINGSIDE: u8 = 0b0100;
    pub const BLACK_QUEENSIDE: u8 = 0b1000;
    pub const ALL: CastlingRights = CastlingRights(0b1111);

    /// Creates new castling rights from flags.
    #[inline]
    pub const fn new(flags: u8) -> Self {
        CastlingRights(flags & 0b1111)
    }

    const fn kingside_flag(color: Color) -> u8 {
        match color {
            Color::White => Self::WHITE_KINGSIDE,
            Color::Black => Self::BLACK_KINGSIDE,
        }
    }

    const fn queenside_flag(color: Color) -> u8 {
        match color {
            Color::White => Self::WHITE_QUEENSIDE,
            Color::Black => Self::BLACK_QUEENSIDE,
        }
    }

    /// Returns true if the given side can castle kingside.
    #[inline]
    pub const fn can_castle_kingside(self, color: Color) -> bool {
        (self.0 & Self::kingside_flag(color)) != 0
    }

    /// Returns true if the given side can castle queenside.
    #[inline]
    pub const fn can_castle_queenside(self, color: Color) -> bool {
        (self.0 & Self::queenside_flag(color)) != 0
    }

    /// Removes castling rights for a color.
    #[inline]
    pub fn remove_color(&mut self, color: Color) {
        self.0 &= !(Self::kingside_flag(color) | Self::queenside_flag(color));
    }

    /// Removes kingside castling for a color.
    #[inline]
    pub fn remove_kingside(&mut self, color: Color) {
        self.0 &= !Self::kingside_flag(color);
    }

    /// Removes queenside castling for a color.
    #[inline]
    pub fn remove_queenside(&mut self, color: Color) {
        self.0 &= !Self::queenside_flag(color);
    }

    /// Drops whichever right depends on a rook standing on `sq`.
    ///
    /// Called for both the origin and the destination of every move, so a
    /// rook leaving its corner and a rook captured in its corner are handled
    /// the same way.
    pub fn remove_for_rook_square(&mut self, sq: Square) {
        match sq {
            Square::H1 => self.remove_kingside(Color::White),
            Square::A1 => self.remove_queenside(Color::White),
            Square::H8 => self.remove_kingside(Color::Black),
            Square::A8 => self.remove_queenside(Color::Black),
            _ => {}
        }
    }

    /// Returns the raw flags.
    #[inline]
    pub const fn raw(self) -> u8 {
        self.0
    }

    /// Flags in [`Fen::CASTLING_LETTERS`] order.
    const LETTER_FLAGS: [u8; 4] = [
        Self::WHITE_KINGSIDE,
        Self::WHITE_QUEENSIDE,
        Self::BLACK_KINGSIDE,
        Self::BLACK_QUEENSIDE,
    ];

    fn from_letters(held: [bool; 4]) -> Self {
        let flags = Self::LETTER_FLAGS
            .iter()
            .zip(held)
            .filter(|&(_, held)| held)
            .fold(0, |flags, (&flag, _)| flags | flag);
        CastlingRights::new(flags)
    }

    fn letters(self) -> [bool; 4] {
        Self::LETTER_FLAGS.map(|flag| self.0 & flag != 0)
    }
}

/// The part of a position that decides whether two positions repeat.
///
/// Move clocks are excluded.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RepetitionKey {
    board: Board,
    side_to_move: Color,
    castling: CastlingRights,
    en_passant: Option<Square>,
}

/// Complete chess position state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Position {
    /// Piece placement.
    pub board: Board,

    /// The side to move.
    pub side_to_move: Color,

    /// Castling rights.
    pub castling: CastlingRights,

    /// En passant target square (if any).
    pub en_passant: Option<Square>,

    /// Halfmove clock for 50-move rule.
    pub halfmove_clock: u32,

    /// Fullmove number (starts at 1, increments after Black's move).
    pub fullmove_number: u32,
}

impl Position {
    /// Creates an empty position.
    pub fn empty() -> Self {
        Position {
            board: Board::empty(),
            side_to_move: Color::White,
            castling: CastlingRights::NONE,
            en_passant: None,
            halfmove_clock: 0,
            fullmove_number: 1,
        }
    }

    /// Creates the standard starting position.
    pub fn startpos() -> Self {
        let mut position = Position::empty();
        let back = [
            PieceKind::Rook,
            PieceKind::Knight,
            PieceKind::Bishop,
            PieceKind::Queen,
            PieceKind::King,
            PieceKind::Bishop,
            PieceKind::Knight,
            PieceKind::Rook,
        ];
        for color in Color::ALL {
            for (col, kind) in (0u8..).zip(back) {
                if let Some(sq) = Square::new(color.back_row(), col) {
                    position.board.set(sq, Some(Piece::new(kind, color)));
                }
                if let Some(sq) = Square::new(color.pawn_row(), col) {
                    position.board.set(sq, Some(Piece::new(PieceKind::Pawn, color)));
                }
            }
        }
        position.castling = CastlingRights::ALL;
        position
    }

    /// Creates a position from a FEN string.
    ///
    /// Validation is syntactic; a placement without kings is accepted here
    /// and rejected by [`crate::Game::from_position`].
    pub fn from_fen(fen: &str) -> Result<Self, FenError> {
        Ok(Self::from(Fen::parse(fen)?))
    }

    /// Converts the position to a FEN string.
    pub fn to_fen(&self) -> String {
        Fen::from(self).to_string()
    }

    /// Returns the piece at the given square, if any.
    #[inline]
    pub fn piece_at(&self, sq: Square) -> Option<Piece> {
        self.board.get(sq)
    }

    /// Returns the key used for repetition detection.
    pub fn repetition_key(&self) -> RepetitionKey {
        RepetitionKey {
            board: self.board,
            side_to_move: self.side_to_move,
            castling: self.castling,
            en_passant: self.en_passant,
        }
    }
}

impl From<Fen> for Position {
    fn from(fen: Fen) -> Self {
        let mut board = Board::empty();
        for (sq, piece) in Square::all().zip(fen.placement) {
            board.set(sq, piece);
        }
        Position {
            board,
            side_to_move: fen.side_to_move,
            castling: CastlingRights::from_letters(fen.castling),
            en_passant: fen.en_passant,
            halfmove_clock: fen.halfmove_clock,
            fullmove_number: fen.fullmove_number,
        }
    }
}

impl From<&Position> for Fen {
    fn from(position: &Position) -> Self {
        let mut placement = [None; 64];
        for (sq, piece) in position.board.pieces() {
            placement[sq.index() as usize] = Some(piece);
        }
        Fen {
            placement,
            side_to_move: position.side_to_move,
            castling: position.castling.letters(),
            en_passant: position.en_passant,
            halfmove_clock: position.halfmove_clock,
            fullmove_number: position.fullmove_number,
        }
    }
}

impl Default for Position {
    fn default() -> Self {
        Self::startpos()
    }
}
