use anyhow::{bail, ensure, Context, Result};
use geo::{Coord, LineString, MultiPolygon, Polygon};

const WKB_POLYGON: u32 = 3;
const WKB_MULTI_POLYGON: u32 = 6;
const WKB_COLLECTION: u32 = 7;

/// EWKB flag bits on the geometry type.
const EWKB_Z: u32 = 0x8000_0000;
const EWKB_M: u32 = 0x4000_0000;
const EWKB_SRID: u32 = 0x2000_0000;

/// Minimal WKB cursor: polygons, multi-polygons and collections of them, ISO or EWKB.
struct WkbReader<'a> {
    bytes: &'a [u8],
    pos: usize,
}

impl WkbReader<'_> {
    fn take<const N: usize>(&mut self) -> Result<[u8; N]> {
        let end = self.pos + N;
        ensure!(end <= self.bytes.len(), "[io::wkb] Unexpected end of data at byte {}", self.pos);
        let mut out = [0u8; N];
        out.copy_from_slice(&self.bytes[self.pos..end]);
        self.pos = end;
        Ok(out)
    }

    fn u32(&mut self, le: bool) -> Result<u32> {
        let bytes = self.take::<4>()?;
        Ok(if le { u32::from_le_bytes(bytes) } else { u32::from_be_bytes(bytes) })
    }

    fn f64(&mut self, le: bool) -> Result<f64> {
        let bytes = self.take::<8>()?;
        Ok(if le { f64::from_le_bytes(bytes) } else { f64::from_be_bytes(bytes) })
    }

    /// Read an element count, rejecting counts the remaining bytes cannot hold.
    fn count(&mut self, le: bool, min_size: usize) -> Result<usize> {
        let n = self.u32(le)? as usize;
        let remaining = self.bytes.len() - self.pos;
        ensure!(n.saturating_mul(min_size) <= remaining, "[io::wkb] Count {n} exceeds the remaining {remaining} bytes");
        Ok(n)
    }

    fn ring(&mut self, le: bool, dims: usize) -> Result<LineString<f64>> {
        let n = self.count(le, dims * 8)?;
        let mut coords = Vec::with_capacity(n);
        for _ in 0..n {
            let x = self.f64(le)?;
            let y = self.f64(le)?;
            for _ in 2..dims { self.f64(le)?; }
            coords.push(Coord { x, y });
        }
        Ok(LineString::from(coords))
    }

    fn polygon(&mut self, le: bool, dims: usize) -> Result<Polygon<f64>> {
        let rings = self.count(le, 4)?;
        ensure!(rings > 0, "[io::wkb] Polygon must have at least one ring");
        let exterior = self.ring(le, dims)?;
        let interiors = (1..rings)
            .map(|_| self.ring(le, dims))
            .collect::<Result<Vec<_>>>()?;
        Ok(Polygon::new(exterior, interiors))
    }

    /// Read one geometry with its header, appending its polygons to `out`.
    fn geometry(&mut self, out: &mut Vec<Polygon<f64>>) -> Result<()> {
        let le = match self.take::<1>()?[0] {
            0 => false,
            1 => true,
            b => bail!("[io::wkb] Invalid byte order marker: {b}"),
        };
        let raw = self.u32(le)?;
        if raw & EWKB_SRID != 0 { self.u32(le)?; }

        let base = raw & 0x0FFF_FFFF;
        let (iso_dims, kind) = (base / 1000, base % 1000);
        let z = raw & EWKB_Z != 0 || matches!(iso_dims, 1 | 3);
        let m = raw & EWKB_M != 0 || matches!(iso_dims, 2 | 3);
        let dims = 2 + z as usize + m as usize;

        match kind {
            WKB_POLYGON => out.push(self.polygon(le, dims)?),
            WKB_MULTI_POLYGON | WKB_COLLECTION => {
                let n = self.count(le, 5)?;
                for _ in 0..n {
                    self.geometry(out)?;
                }
            }
            other => bail!("[io::wkb] Expected a polygonal geometry, got WKB type {other}"),
        }
        Ok(())
    }
}

/// Decode a WKB (or EWKB) Polygon or MultiPolygon into a multi-polygon.
pub fn decode_wkb(bytes: &[u8]) -> Result<MultiPolygon<f64>> {
    let mut reader = WkbReader { bytes, pos: 0 };
    let mut polygons = Vec::new();
    reader.geometry(&mut polygons).context("[io::wkb] Failed to decode geometry")?;
    Ok(MultiPolygon::new(polygons))
}

/// Test-only encoder for 2D polygons.
#[cfg(test)]
pub(crate) fn encode_wkb(shape: &MultiPolygon<f64>, le: bool) -> Vec<u8> {
    let u32_bytes = |v: u32| if le { v.to_le_bytes() } else { v.to_be_bytes() };
    let f64_bytes = |v: f64| if le { v.to_le_bytes() } else { v.to_be_bytes() };
    let order = if le { 1u8 } else { 0u8 };

    let mut out = vec![order];
    out.extend(u32_bytes(WKB_MULTI_POLYGON));
    out.extend(u32_bytes(shape.0.len() as u32));
    for polygon in &shape.0 {
        out.push(order);
        out.extend(u32_bytes(WKB_POLYGON));
        let rings = std::iter::once(polygon.exterior()).chain(polygon.interiors()).collect::<Vec<_>>();
        out.extend(u32_bytes(rings.len() as u32));
        for ring in rings {
            out.extend(u32_bytes(ring.0.len() as u32));
            for c in &ring.0 {
                out.extend(f64_bytes(c.x));
                out.extend(f64_bytes(c.y));
            }
        }
    }
    out
}
