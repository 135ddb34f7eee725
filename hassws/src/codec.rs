//! RFC 6455 frame codec.
//!
//! Client frames are always masked with a fresh 4-byte key. Server frames are
//! usually unmasked, but a mask is honored when present. Fragmentation is not
//! reassembled: Home Assistant sends each JSON message as a single FIN frame.

use std::io::{self, Read};

use crate::WsError;

const FIN: u8 = 0x80;
const MASK_BIT: u8 = 0x80;
const LEN_16: u8 = 126;
const LEN_64: u8 = 127;

/// Largest payload accepted from the server. Registry and dashboard dumps stay
/// well under this.
pub const MAX_PAYLOAD: u64 = 64 << 20;

/// Frame type carried in the low 4 bits of the first header byte.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Opcode {
    Continuation,
    Text,
    Binary,
    Close,
    Ping,
    Pong,
    /// Reserved opcodes are passed through untouched.
    Other(u8),
}

impl Opcode {
    #[must_use]
    pub fn as_u8(self) -> u8 {
        match self {
            Self::Continuation => 0x0,
            Self::Text => 0x1,
            Self::Binary => 0x2,
            Self::Close => 0x8,
            Self::Ping => 0x9,
            Self::Pong => 0xA,
            Self::Other(value) => value & 0x0F,
        }
    }

    #[must_use]
    pub fn from_u8(value: u8) -> Self {
        match value & 0x0F {
            0x0 => Self::Continuation,
            0x1 => Self::Text,
            0x2 => Self::Binary,
            0x8 => Self::Close,
            0x9 => Self::Ping,
            0xA => Self::Pong,
            other => Self::Other(other),
        }
    }
}

/// Encode a single masked client frame with a random mask key.
#[must_use]
pub fn encode_frame(opcode: Opcode, payload: &[u8]) -> Vec<u8> {
    encode_frame_with_mask(opcode, payload, rand::random::<[u8; 4]>())
}

/// Encode a single masked client frame with the given mask key.
#[must_use]
pub fn encode_frame_with_mask(opcode: Opcode, payload: &[u8], mask: [u8; 4]) -> Vec<u8> {
    let len = payload.len();
    let mut out = Vec::with_capacity(len + 14);
    out.push(FIN | opcode.as_u8());

    if len < usize::from(LEN_16) {
        // Guarded above: len < 126 fits in 7 bits.
        #[allow(clippy::cast_possible_truncation)]
        out.push(MASK_BIT | len as u8);
    } else if let Ok(short) = u16::try_from(len) {
        out.push(MASK_BIT | LEN_16);
        out.extend_from_slice(&short.to_be_bytes());
    } else {
        out.push(MASK_BIT | LEN_64);
        out.extend_from_slice(&(len as u64).to_be_bytes());
    }

    out.extend_from_slice(&mask);
    out.extend(payload.iter().enumerate().map(|(i, byte)| byte ^ mask[i % 4]));
    out
}

/// Read one frame from `reader`, blocking until it is complete.
///
/// # Errors
///
/// Returns [`WsError::ConnectionClosed`] when the stream ends before the frame
/// is complete, [`WsError::FrameTooLarge`] when the announced length exceeds
/// [`MAX_PAYLOAD`], and
/// [`WsError::Io`] for other socket failures.
pub fn decode_frame<R: Read>(reader: &mut R) -> Result<(Opcode, Vec<u8>), WsError> {
    let mut header = [0_u8; 2];
    read_exact(reader, &mut header)?;

    let opcode = Opcode::from_u8(header[0]);
    let masked = header[1] & MASK_BIT != 0;
    let len = match header[1] & 0x7F {
        LEN_16 => {
            let mut ext = [0_u8; 2];
            read_exact(reader, &mut ext)?;
            u64::from(u16::from_be_bytes(ext))
        }
        LEN_64 => {
            let mut ext = [0_u8; 8];
            read_exact(reader, &mut ext)?;
            u64::from_be_bytes(ext)
        }
        short => u64::from(short),
    };
    if len > MAX_PAYLOAD {
        return Err(WsError::FrameTooLarge(len));
    }
    let len = usize::try_from(len).map_err(|_| WsError::FrameTooLarge(len))?;

    let mask = if masked {
        let mut key = [0_u8; 4];
        read_exact(reader, &mut key)?;
        Some(key)
    } else {
        None
    };

    let mut payload = vec![0_u8; len];
    read_exact(reader, &mut payload)?;
    if let Some(key) = mask {
        for (i, byte) in payload.iter_mut().enumerate() {
            *byte ^= key[i % 4];
        }
    }

    Ok((opcode, payload))
}

fn read_exact<R: Read>(reader: &mut R, buf: &mut [u8]) -> Result<(), WsError> {
    reader.read_exact(buf).map_err(|error| match error.kind() {
        io::ErrorKind::UnexpectedEof => WsError::ConnectionClosed,
        _ => WsError::Io(error),
    })
}

#[cfg(test)]
#[path = "codec_test.rs"]
mod tests;
