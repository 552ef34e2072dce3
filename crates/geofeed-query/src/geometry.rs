//! Binary geometry decoding.
//!
//! Stores hand back geometry values in their own binary encoding; the query
//! layer only ever needs the coordinates of a point, so that is the whole
//! interface.

use geo::Point;
use thiserror::Error;

const WKB_POINT: u32 = 1;

const EWKB_Z_FLAG: u32 = 0x8000_0000;
const EWKB_M_FLAG: u32 = 0x4000_0000;
const EWKB_SRID_FLAG: u32 = 0x2000_0000;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum GeometryError {
    #[error("Geometry truncated: needed {needed} bytes, got {available}")]
    Truncated { needed: usize, available: usize },

    #[error("Unknown byte order marker {0:#04x}")]
    InvalidByteOrder(u8),

    #[error("Expected a POINT geometry, found WKB type {0}")]
    NotAPoint(u32),
}

/// Decodes a stored geometry value into a point.
///
/// `x` is the longitude and `y` the latitude for geographic reference systems.
pub trait GeometryDecoder: Send + Sync {
    fn decode_point(&self, bytes: &[u8]) -> Result<Point<f64>, GeometryError>;
}

/// Decoder for OGC WKB and PostGIS EWKB points (2D, Z, M and ZM).
///
/// `POINT EMPTY` decodes to NaN coordinates.
#[derive(Debug, Clone, Copy, Default)]
pub struct EwkbDecoder;

impl GeometryDecoder for EwkbDecoder {
    fn decode_point(&self, bytes: &[u8]) -> Result<Point<f64>, GeometryError> {
        let mut reader = WkbReader::new(bytes)?;

        let raw_type = reader.read_u32()?;
        if raw_type & EWKB_SRID_FLAG != 0 {
            reader.skip(4)?;
        }

        let base_type = (raw_type & !(EWKB_Z_FLAG | EWKB_M_FLAG | EWKB_SRID_FLAG)) % 1000;
        if base_type != WKB_POINT {
            return Err(GeometryError::NotAPoint(raw_type));
        }

        let x = reader.read_f64()?;
        let y = reader.read_f64()?;
        Ok(Point::new(x, y))
    }
}

struct WkbReader<'a> {
    bytes: &'a [u8],
    offset: usize,
    little_endian: bool,
}

impl<'a> WkbReader<'a> {
    fn new(bytes: &'a [u8]) -> Result<Self, GeometryError> {
        let little_endian = match bytes.first() {
            Some(0) => false,
            Some(1) => true,
            Some(other) => return Err(GeometryError::InvalidByteOrder(*other)),
            None => {
                return Err(GeometryError::Truncated {
                    needed: 1,
                    available: 0,
                })
            }
        };

        Ok(Self {
            bytes,
            offset: 1,
            little_endian,
        })
    }

    fn take<const N: usize>(&mut self) -> Result<[u8; N], GeometryError> {
        let end = self.offset + N;
        let slice = self
            .bytes
            .get(self.offset..end)
            .ok_or(GeometryError::Truncated {
                needed: end,
                available: self.bytes.len(),
            })?;
        self.offset = end;

        let mut buf = [0u8; N];
        buf.copy_from_slice(slice);
        Ok(buf)
    }

    fn skip(&mut self, count: usize) -> Result<(), GeometryError> {
        let end = self.offset + count;
        if end > self.bytes.len() {
            return Err(GeometryError::Truncated {
                needed: end,
                available: self.bytes.len(),
            });
        }
        self.offset = end;
        Ok(())
    }

    fn read_u32(&mut self) -> Result<u32, GeometryError> {
        let buf = self.take::<4>()?;
        Ok(if self.little_endian {
            u32::from_le_bytes(buf)
        } else {
            u32::from_be_bytes(buf)
        })
    }

    fn read_f64(&mut self) -> Result<f64, GeometryError> {
        let buf = self.take::<8>()?;
        Ok(if self.little_endian {
            f64::from_le_bytes(buf)
        } else {
            f64::from_be_bytes(buf)
        })
    }
}
