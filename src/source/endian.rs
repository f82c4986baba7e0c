//! Byte-order detection (component D).

use tracing::debug;

use crate::codec::records::Far;
use crate::codec::Endian;
use crate::source::{Source, SourceError};

/// Reads the first 4-byte header and the FAR payload behind it, decides
/// whether the file's multi-byte integers need swapping relative to the
/// host, and rewinds the source so the reader thread (component E) sees
/// the FAR again as its first record.
///
/// The first record of a conforming file is FAR (`rec_typ=0, rec_sub=10`).
/// Its declared `rec_len` is `2` if written in the host's byte order, or
/// `512` (`2` with bytes reversed) if the writer used the opposite order.
/// Anything else is `INVALID_STDF`. A FAR whose `STDF_VER` is not `4` is
/// `WRONG_VERSION`, per the open question in the design notes.
pub fn detect(source: &mut Source) -> Result<Endian, SourceError> {
    let mut header = [0u8; 4];
    source.read_exact(&mut header)?;

    let rec_len_raw = u16::from_ne_bytes([header[0], header[1]]);
    let rec_typ = header[2];
    let rec_sub = header[3];

    if rec_typ != 0 || rec_sub != 10 {
        return Err(SourceError::InvalidStdf);
    }

    let endian = match rec_len_raw {
        2 => Endian::Little,
        512 => Endian::Big,
        _ => return Err(SourceError::InvalidStdf),
    };

    let mut payload = [0u8; 2];
    source.read_exact(&mut payload)?;
    let far = Far::decode(&payload)?;
    if far.stdf_ver != 4 {
        return Err(SourceError::WrongVersion(far.stdf_ver));
    }

    debug!(?endian, cpu_type = far.cpu_type, "detected STDF byte order");
    source.reopen()?;
    Ok(endian)
}
