//! field level parsing. an empty field is "not present", never zero

/// the field had characters in it, but they didn't make sense
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct FieldError;

pub type FieldResult<T> = Result<Option<T>, FieldError>;

/// fixed point decimal with 6 fractional digits. extra digits are truncated
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Fixed(i64);

impl Fixed {
    pub const ONE: i64 = 1_000_000;

    /// tolerant of missing digits on either side of the point. "12." and ".5" are both fine
    pub fn parse(field: &[u8]) -> FieldResult<Self> {
        let (negative, digits) = match field.split_first() {
            None => return Ok(None),
            Some((b'-', rest)) => (true, rest),
            Some(_) => (false, field),
        };

        let mut whole: i64 = 0;
        let mut frac: i64 = 0;
        let mut frac_scale = Self::ONE;
        let mut seen_digit = false;
        let mut seen_point = false;

        for &b in digits {
            match b {
                b'0'..=b'9' => {
                    seen_digit = true;
                    let d = (b - b'0') as i64;

                    if !seen_point {
                        whole = whole
                            .checked_mul(10)
                            .and_then(|x| x.checked_add(d))
                            .ok_or(FieldError)?;
                    } else if frac_scale > 1 {
                        frac_scale /= 10;
                        frac += d * frac_scale;
                    }
                }
                b'.' if !seen_point => seen_point = true,
                _ => return Err(FieldError),
            }
        }

        if !seen_digit {
            return Err(FieldError);
        }

        let scaled = whole
            .checked_mul(Self::ONE)
            .and_then(|x| x.checked_add(frac))
            .ok_or(FieldError)?;

        Ok(Some(Self(if negative { -scaled } else { scaled })))
    }

    pub fn from_scaled(scaled: i64) -> Self {
        Self(scaled)
    }

    pub fn scaled(self) -> i64 {
        self.0
    }

    pub fn whole(self) -> i64 {
        self.0 / Self::ONE
    }

    /// fractional part in millionths
    pub fn frac(self) -> i64 {
        self.0 % Self::ONE
    }

    pub fn as_f64(self) -> f64 {
        self.0 as f64 / Self::ONE as f64
    }
}

/// plain unsigned integer field
pub fn parse_uint(field: &[u8]) -> FieldResult<u32> {
    if field.is_empty() {
        return Ok(None);
    }

    let mut x: u32 = 0;
    for &b in field {
        if !b.is_ascii_digit() {
            return Err(FieldError);
        }
        x = x
            .checked_mul(10)
            .and_then(|x| x.checked_add((b - b'0') as u32))
            .ok_or(FieldError)?;
    }

    Ok(Some(x))
}

/// `ddmm.mmmm` (or `dddmm.mmmm`) plus a hemisphere letter, into signed decimal degrees.
/// both fields have to be there for this to be `Some`
pub fn parse_degrees_minutes(value: &[u8], hemisphere: &[u8], max_degrees: i64) -> FieldResult<f64> {
    let Some(value) = Fixed::parse(value)? else {
        return Ok(None);
    };

    let sign = match hemisphere {
        b"" => return Ok(None),
        b"N" | b"E" => 1.0,
        b"S" | b"W" => -1.0,
        _ => return Err(FieldError),
    };

    let scaled = value.scaled();
    if scaled < 0 {
        return Err(FieldError);
    }

    let degrees = scaled / (100 * Fixed::ONE);
    let minutes = scaled - degrees * 100 * Fixed::ONE;

    if minutes >= 60 * Fixed::ONE || degrees > max_degrees {
        return Err(FieldError);
    }

    let decimal = degrees as f64 + minutes as f64 / (60 * Fixed::ONE) as f64;

    if decimal > max_degrees as f64 {
        return Err(FieldError);
    }

    Ok(Some(sign * decimal))
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct UtcTime {
    pub hour: u8,
    pub minute: u8,
    pub second: u8,
    pub hundredths: u8,
}

/// `hhmmss.ss`
pub fn parse_time(field: &[u8]) -> FieldResult<UtcTime> {
    let Some(value) = Fixed::parse(field)? else {
        return Ok(None);
    };

    if value.scaled() < 0 {
        return Err(FieldError);
    }

    let hhmmss = value.whole();
    let hour = hhmmss / 10_000;
    let minute = (hhmmss / 100) % 100;
    // 60 is a leap second
    let second = hhmmss % 100;

    if hour > 23 || minute > 59 || second > 60 {
        return Err(FieldError);
    }

    Ok(Some(UtcTime {
        hour: hour as u8,
        minute: minute as u8,
        second: second as u8,
        hundredths: (value.frac() / 10_000) as u8,
    }))
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct UtcDate {
    pub year: u16,
    pub month: u8,
    pub day: u8,
}

/// `ddmmyy`. two digit years above 80 are the 1900s
pub fn parse_date(field: &[u8]) -> FieldResult<UtcDate> {
    if field.is_empty() {
        return Ok(None);
    }
    if field.len() != 6 {
        return Err(FieldError);
    }

    let Some(ddmmyy) = parse_uint(field)? else {
        return Ok(None);
    };

    let day = ddmmyy / 10_000;
    let month = (ddmmyy / 100) % 100;
    let yy = ddmmyy % 100;

    if !(1..=31).contains(&day) || !(1..=12).contains(&month) {
        return Err(FieldError);
    }

    let year = if yy > 80 { 1900 + yy } else { 2000 + yy };

    Ok(Some(UtcDate {
        year: year as u16,
        month: month as u8,
        day: day as u8,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test_log::test]
    fn test_fixed_missing_digits() {
        assert_eq!(Fixed::parse(b""), Ok(None));
        assert_eq!(Fixed::parse(b"12."), Ok(Some(Fixed::from_scaled(12_000_000))));
        assert_eq!(Fixed::parse(b".5"), Ok(Some(Fixed::from_scaled(500_000))));
        assert_eq!(Fixed::parse(b"-0.25"), Ok(Some(Fixed::from_scaled(-250_000))));
        assert_eq!(Fixed::parse(b"1.23456789").unwrap().unwrap().frac(), 234_567);
    }

    #[test_log::test]
    fn test_fixed_garbage() {
        assert_eq!(Fixed::parse(b"."), Err(FieldError));
        assert_eq!(Fixed::parse(b"-"), Err(FieldError));
        assert_eq!(Fixed::parse(b"1.2.3"), Err(FieldError));
        assert_eq!(Fixed::parse(b"12a"), Err(FieldError));
    }

    #[test_log::test]
    fn test_fixed_too_big() {
        // the whole part fits after scaling, the fraction pushes it over
        assert_eq!(Fixed::parse(b"9223372036854.999999"), Err(FieldError));
        assert_eq!(Fixed::parse(b"-9223372036854.999999"), Err(FieldError));
        assert_eq!(Fixed::parse(b"9223372036855"), Err(FieldError));
        assert_eq!(
            Fixed::parse(b"9223372036854.775807"),
            Ok(Some(Fixed::from_scaled(i64::MAX)))
        );
    }

    #[test_log::test]
    fn test_degrees_minutes() {
        assert_eq!(parse_degrees_minutes(b"3730.0000", b"N", 90), Ok(Some(37.5)));
        assert_eq!(parse_degrees_minutes(b"12215.0000", b"W", 180), Ok(Some(-122.25)));
        assert_eq!(parse_degrees_minutes(b"", b"N", 90), Ok(None));
        assert_eq!(parse_degrees_minutes(b"3730.0000", b"", 90), Ok(None));
        assert_eq!(parse_degrees_minutes(b"3760.0000", b"N", 90), Err(FieldError));
        assert_eq!(parse_degrees_minutes(b"9130.0000", b"N", 90), Err(FieldError));
        assert_eq!(parse_degrees_minutes(b"3730.0000", b"X", 90), Err(FieldError));
    }

    #[test_log::test]
    fn test_time_and_date() {
        assert_eq!(
            parse_time(b"235959.99"),
            Ok(Some(UtcTime {
                hour: 23,
                minute: 59,
                second: 59,
                hundredths: 99
            }))
        );
        assert_eq!(parse_time(b"246000"), Err(FieldError));

        assert_eq!(
            parse_date(b"010123"),
            Ok(Some(UtcDate {
                year: 2023,
                month: 1,
                day: 1
            }))
        );
        assert_eq!(parse_date(b"311299").unwrap().unwrap().year, 1999);
        assert_eq!(parse_date(b"011323"), Err(FieldError));
        assert_eq!(parse_date(b"0101"), Err(FieldError));
    }
}
