/// Linear resampling of `raw` into `out`, clamped to `[0, max]`.
///
/// Source positions are computed with integer arithmetic so that output
/// indices landing exactly on a raw index reproduce that sample unchanged.
pub fn resample_linear(raw: &[u8], out: &mut [f32], max: f32) {
    let source_len = raw.len();
    let target_len = out.len();
    if source_len == 0 {
        out.fill(0.0);
        return;
    }

    for (i, slot) in out.iter_mut().enumerate() {
        let numerator = i * source_len;
        let i0 = (numerator / target_len).min(source_len - 1);
        let i1 = (i0 + 1).min(source_len - 1);
        let frac = (numerator % target_len) as f32 / target_len as f32;
        let value = raw[i0] as f32 * (1.0 - frac) + raw[i1] as f32 * frac;
        *slot = value.clamp(0.0, max);
    }
}

/// First output index of a `target_len` resampling whose source position
/// reaches `source_index`, clamped to the output.
pub fn first_target_index(source_index: usize, source_len: usize, target_len: usize) -> usize {
    if source_len == 0 || target_len == 0 {
        return 0;
    }
    (source_index * target_len)
        .div_ceil(source_len)
        .min(target_len - 1)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resample_doubles_with_midpoints() {
        let mut out = vec![0.0; 4];
        resample_linear(&[0, 10], &mut out, 80.0);
        assert_eq!(out, vec![0.0, 5.0, 10.0, 10.0]);
    }

    #[test]
    fn resample_of_empty_input_zero_fills() {
        let mut out = vec![3.0; 5];
        resample_linear(&[], &mut out, 80.0);
        assert!(out.iter().all(|&v| v == 0.0));
    }

    #[test]
    fn resample_clamps_to_scale() {
        let mut out = vec![0.0; 2];
        resample_linear(&[95, 95], &mut out, 80.0);
        assert_eq!(out, vec![80.0, 80.0]);
    }

    #[test]
    fn first_target_index_lands_on_or_after_source() {
        assert_eq!(first_target_index(40, 90, 90), 40);
        assert_eq!(first_target_index(40, 90, 144), 64);
        assert_eq!(first_target_index(41, 90, 144), 66);
        assert_eq!(first_target_index(40, 90, 360), 160);
        assert_eq!(first_target_index(40, 90, 720), 320);
        assert_eq!(first_target_index(89, 90, 60), 59);
        assert_eq!(first_target_index(3, 0, 60), 0);
    }
}
