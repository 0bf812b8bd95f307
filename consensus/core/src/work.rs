use primitive_types::U256;

use crate::BlueWorkType;

/// Converts compact difficulty bits to a 256-bit target
pub fn bits_to_target(bits: u32) -> U256 {
    let exponent = (bits >> 24) as usize;
    let mantissa = bits & 0x00ff_ffff;

    if exponent <= 3 {
        U256::from(mantissa >> (8 * (3 - exponent)))
    } else {
        let shift = 8 * (exponent - 3);
        let mantissa = U256::from(mantissa);
        // A shift past the top bit of a non-zero mantissa saturates
        if mantissa.is_zero() || shift + mantissa.bits() <= 256 {
            mantissa << shift
        } else {
            U256::MAX
        }
    }
}

/// Expected number of hashes needed to find a block at the given difficulty bits.
///
/// Computes `2^256 / (target + 1)` as `!target / (target + 1) + 1`, clamped into the blue work width.
pub fn calc_work(bits: u32) -> BlueWorkType {
    let target = bits_to_target(bits);
    if target.is_zero() {
        return BlueWorkType::ZERO;
    }
    let work = match target.checked_add(U256::one()) {
        Some(denominator) => (!target / denominator) + U256::one(),
        None => U256::one(),
    };
    if work.0[3] != 0 {
        return BlueWorkType::MAX;
    }
    BlueWorkType::from_le_limbs([work.0[0], work.0[1], work.0[2]])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn target_from_compact_bits() {
        assert_eq!(bits_to_target(0x1d00ffff), U256::from(0xffffu64) << (8 * (0x1d - 3)));
        assert_eq!(bits_to_target(0x03123456), U256::from(0x123456u64));
        assert_eq!(bits_to_target(0x02123456), U256::from(0x1234u64));
        assert_eq!(bits_to_target(0xff7fffff), U256::MAX);
    }

    #[test]
    fn work_decreases_with_target() {
        let easy = calc_work(0x207fffff);
        let hard = calc_work(0x1d00ffff);
        assert!(hard > easy);
        assert!(!easy.is_zero());
        // 2^256 / 2^255 == 2
        assert_eq!(calc_work(0x207fffff), BlueWorkType::from(2u64));
        assert_eq!(calc_work(0x1d00ffff), BlueWorkType::from(0x0000_0001_0001_0001u64));
    }

    #[test]
    fn degenerate_targets() {
        assert_eq!(calc_work(0), BlueWorkType::ZERO);
        assert_eq!(calc_work(0xff7fffff), BlueWorkType::from(1u64));
        // Target 1 means 2^255 expected hashes which does not fit 192 bits
        assert_eq!(calc_work(0x01010000), BlueWorkType::MAX);
    }
}
