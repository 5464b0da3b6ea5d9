/*!
    Timestamp and time base types.
*/

/// Ticks per second of the pipeline's shared coarse time base. Both the
/// codec time base and the presentation-timestamp cadence use this unit.
pub const TICKS_PER_SECOND: i32 = 1_000_000;

/**
    A rational number, used for time bases and frame rates.
*/
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Rational {
    pub num: i32,
    pub den: i32,
}

impl Rational {
    /// The pipeline's microsecond time base.
    pub const MICROS: Self = Self {
        num: 1,
        den: TICKS_PER_SECOND,
    };

    pub const fn new(num: i32, den: i32) -> Self {
        Self { num, den }
    }

    /**
        Returns the rational as a float. Zero denominators yield zero
        rather than a division error.
    */
    pub fn to_f64(self) -> f64 {
        if self.den == 0 {
            0.0
        } else {
            self.num as f64 / self.den as f64
        }
    }
}

/**
    A presentation timestamp, in the time base of its carrying frame or packet.
*/
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Pts(pub i64);

/**
    A duration, in the time base of its carrying packet.
*/
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct MediaDuration(pub i64);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rational_to_f64() {
        assert_eq!(Rational::new(30, 1).to_f64(), 30.0);
        assert_eq!(Rational::new(1, 2).to_f64(), 0.5);
        assert_eq!(Rational::new(1, 0).to_f64(), 0.0);
    }

    #[test]
    fn micros_time_base() {
        assert_eq!(Rational::MICROS, Rational::new(1, 1_000_000));
    }

    #[test]
    fn pts_ordering() {
        assert!(Pts(0) < Pts(33_333));
        assert!(Pts(33_333) < Pts(66_666));
    }
}
