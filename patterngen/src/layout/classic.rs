/// Data string for a classic layout of the given grid size.
///
/// Rings by Chebyshev distance from the edge: 0 is the white quiet ring,
/// 1 the black border, everything further in carries data.
pub fn classic_data_string(size: usize) -> String {
    let mut s = String::with_capacity(size * size);
    for y in 0..size {
        for x in 0..size {
            let ring = x.min(size - 1 - x).min(y.min(size - 1 - y));
            s.push(match ring {
                0 => 'w',
                1 => 'b',
                _ => 'd',
            });
        }
    }
    s
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classic_8x8_rows() {
        let s = classic_data_string(8);
        assert_eq!(s.len(), 64);
        assert_eq!(&s[0..8], "wwwwwwww");
        assert_eq!(&s[8..16], "wbbbbbbw");
        assert_eq!(&s[16..24], "wbddddbw");
    }

    #[test]
    fn classic_10x10_has_36_data_cells() {
        let s = classic_data_string(10);
        assert_eq!(s.chars().filter(|&c| c == 'd').count(), 36);
        assert_eq!(&s[20..30], "wbddddddbw");
    }
}
