//! Synthetic piece data.

use tessera_primitives::UnpaddedPieceSize;
use tokio::io::{AsyncReadExt, Repeat, Take};

/// A reader yielding exactly `size` zero bytes.
pub fn null_reader(size: UnpaddedPieceSize) -> Take<Repeat> {
    tokio::io::repeat(0).take(size.0)
}
