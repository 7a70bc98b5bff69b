//! VP9 probability context buffer initialisation.

pub mod tables;

use tracing::trace;

use crate::MhwStatus;
use tables::*;

/// Size of one probability context buffer.
pub const PROB_MAX_NUM_ELEM: usize = 2048;
/// First byte that differs between key-frame and inter-frame defaults.
pub const INTER_PROB_OFFSET: usize = 1667;
/// Segmentation tree and prediction probabilities.
pub const SEG_PROB_OFFSET: usize = 2010;
/// Segment tree (7) and prediction (3) probabilities, owned by the caller.
pub const SEG_PROB_LEN: usize = 7 + 3;

const TX_PADDING: usize = 52;
const COEF_PADDING: usize = 16;
const UV_MODE_PADDING: usize = 47;
const TAIL_PADDING: usize = 28;

/// Sequential writer over the context buffer. Every step is bounds checked.
struct ProbWriter<'a> {
    buf: &'a mut [u8],
    cursor: usize,
}

impl<'a> ProbWriter<'a> {
    fn at(buf: &'a mut [u8], cursor: usize) -> Self {
        Self { buf, cursor }
    }

    fn put(&mut self, probs: &[u8]) -> Result<(), MhwStatus> {
        let end = self.cursor + probs.len();
        if end > self.buf.len() || end > PROB_MAX_NUM_ELEM {
            return Err(MhwStatus::NoSpace);
        }
        self.buf[self.cursor..end].copy_from_slice(probs);
        self.cursor = end;
        Ok(())
    }

    fn put_rows<const N: usize>(&mut self, rows: &[[u8; N]]) -> Result<(), MhwStatus> {
        for row in rows {
            self.put(row)?;
        }
        Ok(())
    }

    /// Advances without touching the bytes.
    fn skip(&mut self, count: usize) -> Result<(), MhwStatus> {
        if self.cursor + count > PROB_MAX_NUM_ELEM {
            return Err(MhwStatus::NoSpace);
        }
        self.cursor += count;
        Ok(())
    }

    fn zero(&mut self, count: usize) -> Result<(), MhwStatus> {
        let end = self.cursor + count;
        if end > self.buf.len() || end > PROB_MAX_NUM_ELEM {
            return Err(MhwStatus::NoSpace);
        }
        self.buf[self.cursor..end].fill(0);
        self.cursor = end;
        Ok(())
    }

    /// Writes `rows` unless `skip` is set, in which case the bytes are left as they are.
    fn put_rows_or_skip<const N: usize>(
        &mut self,
        rows: &[[u8; N]],
        skip: bool,
    ) -> Result<(), MhwStatus> {
        if skip {
            self.skip(rows.len() * N)
        } else {
            self.put_rows(rows)
        }
    }

    fn put_or_skip(&mut self, probs: &[u8], skip: bool) -> Result<(), MhwStatus> {
        if skip {
            self.skip(probs.len())
        } else {
            self.put(probs)
        }
    }
}

/// Fills `buf` with the default VP9 probabilities.
///
/// Key-frame resets leave the inter-only tables zeroed and use the key-frame partition and
/// uv-mode tables. The segmentation probabilities are not touched; only the padding after
/// them is zeroed.
pub fn init_context_buffer(buf: &mut [u8], reset_to_key_frame_defaults: bool) -> Result<(), MhwStatus> {
    if buf.len() < PROB_MAX_NUM_ELEM {
        return Err(MhwStatus::NoSpace);
    }
    buf[..SEG_PROB_OFFSET].fill(0);

    let mut w = ProbWriter::at(buf, 0);
    w.put_rows(&TX_PROBS_8X8)?;
    w.put_rows(&TX_PROBS_16X16)?;
    w.put_rows(&TX_PROBS_32X32)?;
    w.skip(TX_PADDING)?;
    for table in [&COEF_PROBS_4X4, &COEF_PROBS_8X8, &COEF_PROBS_16X16, &COEF_PROBS_32X32] {
        w.put(table)?;
    }
    w.skip(COEF_PADDING)?;
    w.put(&MBSKIP_PROBS)?;
    debug_assert_eq!(w.cursor, INTER_PROB_OFFSET);

    init_frame_type_probs(buf, reset_to_key_frame_defaults)?;

    let mut w = ProbWriter::at(buf, SEG_PROB_OFFSET);
    w.skip(SEG_PROB_LEN)?;
    w.zero(TAIL_PADDING)?;
    trace!(end = w.cursor, key = reset_to_key_frame_defaults, "vp9 context buffer initialised");
    Ok(())
}

/// Rewrites only the probabilities that differ between key and inter frames.
pub fn init_frame_type_probs(buf: &mut [u8], set_to_key: bool) -> Result<(), MhwStatus> {
    let mut w = ProbWriter::at(buf, INTER_PROB_OFFSET);

    w.put_rows_or_skip(&INTER_MODE_PROBS, set_to_key)?;
    w.put_rows_or_skip(&SWITCHABLE_INTERP_PROBS, set_to_key)?;
    w.put_or_skip(&INTRA_INTER_PROBS, set_to_key)?;
    w.put_or_skip(&COMP_INTER_PROBS, set_to_key)?;
    w.put_rows_or_skip(&SINGLE_REF_PROBS, set_to_key)?;
    w.put_or_skip(&COMP_REF_PROBS, set_to_key)?;
    // Key frames use the hardware's built-in y-mode table.
    w.put_rows_or_skip(&Y_MODE_PROBS, set_to_key)?;

    if set_to_key {
        w.put_rows(&KF_PARTITION_PROBS)?;
    } else {
        w.put_rows(&PARTITION_PROBS)?;
    }

    let mv = &NMV_CONTEXT;
    w.put_or_skip(&mv.joints, set_to_key)?;
    for comp in &mv.comps {
        w.put_or_skip(&[comp.sign], set_to_key)?;
        w.put_or_skip(&comp.classes, set_to_key)?;
        w.put_or_skip(&comp.class0, set_to_key)?;
        w.put_or_skip(&comp.bits, set_to_key)?;
    }
    for comp in &mv.comps {
        w.put_rows_or_skip(&comp.class0_fp, set_to_key)?;
        w.put_or_skip(&comp.fp, set_to_key)?;
    }
    for comp in &mv.comps {
        w.put_or_skip(&[comp.class0_hp, comp.hp], set_to_key)?;
    }

    w.skip(UV_MODE_PADDING)?;

    if set_to_key {
        w.put_rows(&KF_UV_MODE_PROBS)?;
    } else {
        w.put_rows(&UV_MODE_PROBS)?;
    }

    if w.cursor != SEG_PROB_OFFSET {
        return Err(MhwStatus::Unknown);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn init(key: bool) -> Vec<u8> {
        let mut buf = vec![0xAAu8; PROB_MAX_NUM_ELEM];
        init_context_buffer(&mut buf, key).unwrap();
        buf
    }

    #[test]
    fn short_buffer_is_rejected_untouched() {
        let mut buf = vec![0x55u8; PROB_MAX_NUM_ELEM - 1];
        assert_eq!(init_context_buffer(&mut buf, true), Err(MhwStatus::NoSpace));
        assert!(buf.iter().all(|&b| b == 0x55));
    }

    #[test]
    fn shared_prefix() {
        let key = init(true);
        let inter = init(false);
        assert_eq!(&key[..INTER_PROB_OFFSET], &inter[..INTER_PROB_OFFSET]);
        assert_eq!(&key[..12], &[100, 66, 20, 152, 15, 101, 3, 136, 37, 5, 52, 13]);
        assert!(key[12..64].iter().all(|&b| b == 0));
        assert_eq!(&key[64..67], &[195, 29, 183]);
        assert_eq!(&key[1664..1667], &MBSKIP_PROBS);
    }

    #[test]
    fn key_frame_skips_inter_tables() {
        let key = init(true);
        // Inter mode through y-mode.
        assert!(key[1667..1756].iter().all(|&b| b == 0));
        assert_eq!(&key[1756..1759], &KF_PARTITION_PROBS[0]);
        // Motion vector tables and padding.
        assert!(key[1804..1920].iter().all(|&b| b == 0));
        assert_eq!(&key[1920..1929], &KF_UV_MODE_PROBS[0]);
    }

    #[test]
    fn inter_frame_tables() {
        let inter = init(false);
        assert_eq!(&inter[1667..1670], &INTER_MODE_PROBS[0]);
        assert_eq!(&inter[1756..1759], &PARTITION_PROBS[0]);
        assert_eq!(&inter[1804..1807], &NMV_CONTEXT.joints);
        assert_eq!(inter[1807], NMV_CONTEXT.comps[0].sign);
        assert_eq!(&inter[1920..1929], &UV_MODE_PROBS[0]);
    }

    #[test]
    fn segmentation_probs_are_preserved() {
        for key in [true, false] {
            let mut buf = vec![0xAAu8; PROB_MAX_NUM_ELEM];
            buf[SEG_PROB_OFFSET..SEG_PROB_OFFSET + 7].copy_from_slice(&[255, 128, 64, 32, 16, 8, 4]);
            init_context_buffer(&mut buf, key).unwrap();

            assert_eq!(&buf[2010..2017], &[255, 128, 64, 32, 16, 8, 4]);
            assert_eq!(&buf[2017..2020], &[0xAA; 3]);
            assert!(buf[2020..PROB_MAX_NUM_ELEM].iter().all(|&b| b == 0));
        }
    }

    #[test]
    fn frame_types_differ_only_in_type_specific_ranges() {
        let key = init(true);
        let inter = init(false);
        let differing: Vec<usize> = (0..PROB_MAX_NUM_ELEM).filter(|&i| key[i] != inter[i]).collect();
        assert!(differing.iter().all(|&i| (INTER_PROB_OFFSET..SEG_PROB_OFFSET).contains(&i)));
        assert!(!differing.is_empty());
    }
}
