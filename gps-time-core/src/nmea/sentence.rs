//! the two sentence kinds we actually track. everything else is checksummed and dropped

use super::fields::{
    FieldError, Fixed, UtcDate, UtcTime, parse_date, parse_degrees_minutes, parse_time,
    parse_uint,
};
use crate::fix::Coordinate;

/// more than any sentence we parse needs. extra fields are ignored
const MAX_FIELDS: usize = 24;

const KNOTS_TO_KMH: f64 = 1.852;

/// recommended minimum data. the only sentence that can replace the fix
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Rmc {
    pub time: Option<UtcTime>,
    /// `A` in the status field. `V` means the receiver doesn't trust its own data
    pub active: bool,
    pub position: Option<Coordinate>,
    pub speed_kmh: Option<f32>,
    pub course_deg: Option<f32>,
    pub date: Option<UtcDate>,
}

/// fix data. we only want the satellite count out of this
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Gga {
    pub time: Option<UtcTime>,
    /// 0 is "no fix"
    pub quality: Option<u8>,
    pub satellites: Option<u8>,
}

#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Sentence {
    Rmc(Rmc),
    Gga(Gga),
    /// valid checksum, but not a kind we use. the address is kept for logging
    Other(heapless::String<8>),
}

impl Sentence {
    /// `body` is everything between `$` and `*`
    pub fn parse(body: &[u8]) -> Result<Self, FieldError> {
        let mut fields = heapless::Vec::<&[u8], MAX_FIELDS>::new();
        for field in body.split(|&b| b == b',') {
            if fields.push(field).is_err() {
                break;
            }
        }

        let address = fields.first().copied().unwrap_or_default();

        // any talker. GP, GN, GL, ... all mean the same thing to us
        match sentence_kind(address) {
            Some(b"RMC") => Rmc::from_fields(&fields).map(Self::Rmc),
            Some(b"GGA") => Gga::from_fields(&fields).map(Self::Gga),
            _ => {
                let mut name = heapless::String::new();
                for &b in address.iter().take(name.capacity()) {
                    if name.push(b as char).is_err() {
                        break;
                    }
                }
                Ok(Self::Other(name))
            }
        }
    }
}

fn sentence_kind(address: &[u8]) -> Option<&[u8]> {
    if address.len() == 5 && address.iter().all(u8::is_ascii_alphanumeric) {
        Some(&address[2..])
    } else {
        None
    }
}

fn field<'a>(fields: &[&'a [u8]], i: usize) -> &'a [u8] {
    fields.get(i).copied().unwrap_or_default()
}

impl Rmc {
    fn from_fields(fields: &[&[u8]]) -> Result<Self, FieldError> {
        // through the date field. magnetic variation and mode are optional
        if fields.len() < 10 {
            return Err(FieldError);
        }

        let time = parse_time(field(fields, 1))?;

        let active = match field(fields, 2) {
            b"A" => true,
            b"V" | b"" => false,
            _ => return Err(FieldError),
        };

        let latitude = parse_degrees_minutes(field(fields, 3), field(fields, 4), 90)?;
        let longitude = parse_degrees_minutes(field(fields, 5), field(fields, 6), 180)?;

        let position = match (latitude, longitude) {
            (Some(latitude), Some(longitude)) => Some(Coordinate {
                latitude,
                longitude,
            }),
            _ => None,
        };

        let speed_kmh = Fixed::parse(field(fields, 7))?.map(|x| (x.as_f64() * KNOTS_TO_KMH) as f32);
        let course_deg = Fixed::parse(field(fields, 8))?.map(|x| x.as_f64() as f32);

        let date = parse_date(field(fields, 9))?;

        Ok(Self {
            time,
            active,
            position,
            speed_kmh,
            course_deg,
            date,
        })
    }
}

impl Gga {
    fn from_fields(fields: &[&[u8]]) -> Result<Self, FieldError> {
        if fields.len() < 8 {
            return Err(FieldError);
        }

        let time = parse_time(field(fields, 1))?;

        let quality = parse_uint(field(fields, 6))?
            .map(|x| u8::try_from(x).map_err(|_| FieldError))
            .transpose()?;
        let satellites = parse_uint(field(fields, 7))?
            .map(|x| u8::try_from(x).map_err(|_| FieldError))
            .transpose()?;

        Ok(Self {
            time,
            quality,
            satellites,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test_log::test]
    fn test_rmc() {
        let sentence =
            Sentence::parse(b"GPRMC,123519.50,A,4807.038,N,01131.000,E,022.4,084.4,230394,003.1,W")
                .unwrap();

        let rmc = match sentence {
            Sentence::Rmc(x) => x,
            other => panic!("expected rmc, got {:?}", other),
        };

        assert!(rmc.active);
        assert_eq!(
            rmc.time,
            Some(UtcTime {
                hour: 12,
                minute: 35,
                second: 19,
                hundredths: 50
            })
        );
        assert_eq!(
            rmc.date,
            Some(UtcDate {
                year: 1994,
                month: 3,
                day: 23
            })
        );

        let position = rmc.position.unwrap();
        assert!((position.latitude - 48.1173).abs() < 1e-9);
        assert!((position.longitude - 11.516_666_666).abs() < 1e-6);

        assert!((rmc.speed_kmh.unwrap() - 41.4848).abs() < 1e-3);
        assert!((rmc.course_deg.unwrap() - 84.4).abs() < 1e-4);
    }

    #[test_log::test]
    fn test_rmc_other_talker_and_void() {
        let Ok(Sentence::Rmc(rmc)) = Sentence::parse(b"GNRMC,,V,,,,,,,,,,N") else {
            panic!("GN talker should still parse as rmc");
        };

        assert!(!rmc.active);
        assert_eq!(rmc.position, None);
        assert_eq!(rmc.time, None);
        assert_eq!(rmc.speed_kmh, None);
    }

    #[test_log::test]
    fn test_rmc_garbage_field() {
        assert_eq!(
            Sentence::parse(b"GPRMC,000000.00,A,37x0.0000,N,12215.0000,W,0.00,0.00,010123,,,A"),
            Err(FieldError)
        );
        assert_eq!(Sentence::parse(b"GPRMC,000000.00,A"), Err(FieldError));
    }

    #[test_log::test]
    fn test_gga() {
        let sentence =
            Sentence::parse(b"GPGGA,000000.00,3730.0000,N,12215.0000,W,1,07,1.0,10.0,M,0.0,M,,")
                .unwrap();

        assert_eq!(
            sentence,
            Sentence::Gga(Gga {
                time: Some(UtcTime {
                    hour: 0,
                    minute: 0,
                    second: 0,
                    hundredths: 0
                }),
                quality: Some(1),
                satellites: Some(7),
            })
        );
    }

    #[test_log::test]
    fn test_other() {
        let sentence = Sentence::parse(b"GPGSV,1,1,00").unwrap();
        assert_eq!(sentence, Sentence::Other("GPGSV".try_into().unwrap()));

        let sentence = Sentence::parse(b"PMTK001,314,3").unwrap();
        assert_eq!(sentence, Sentence::Other("PMTK001".try_into().unwrap()));
    }
}
