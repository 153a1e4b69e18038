//! WiGLE Android CSV export.
//!
//! ```text
//! WigleWifi-1.4,appRelease=2.26,model=Nexus 5,release=6.0.1,device=hammerhead,display=MMB29S,board=hammerhead,brand=google
//! MAC,SSID,AuthMode,FirstSeen,Channel,RSSI,CurrentLatitude,CurrentLongitude,AltitudeMeters,AccuracyMeters,Type
//! 00:22:6b:50:eb:05,dogtown,[WPA2-PSK-CCMP][WPS][ESS],2011-12-11 19:34:21,6,-34,37.8428930835798,-122.247731778771,46,10,WIFI
//! ```
//!
//! The app writes `0` for unknown altitude, accuracy and RSSI, and `?` for an unknown position.
//! Cell tower rows (`CDMA`, `GSM`) are skipped.

use std::ops::RangeInclusive;

use once_cell::sync::Lazy;
use regex::Regex;
use wifitsv_core::constraints::NULL_BSSID;
use wifitsv_core::{canonicalize, RawObservation, Result, WifiTsvError, CONSTRAINTS};

use super::{line_location, parse_field, utc_timestamp, Extracted, LineAdapter};

/// Command line name.
pub const FORMAT: &str = "wigle-csv";

const HEADER: &str = "MAC,SSID,AuthMode,FirstSeen,Channel,RSSI,CurrentLatitude,CurrentLongitude,AltitudeMeters,AccuracyMeters,Type";

/// Altitudes outside this range mean the file is broken, not just the GPS.
const PLAUSIBLE_ALTITUDE: RangeInclusive<f64> = -130_000.0..=11_000.0;

/// Accuracies outside this range mean the file is broken, not just the GPS.
const PLAUSIBLE_ACCURACY: RangeInclusive<f64> = 0.0..=430_000.0;

static RECORD: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?x)
        ^((?:[0-9a-f]{2}:){5}[0-9a-f]{2}),                              # BSSID
        (.{0,32}),                                                      # SSID
        (?:\[.+\])*,                                                    # [Security]
        ((?:19|20)?\d{2}-[0-2]\d-[0-3]\d\x20[0-2]\d:[0-5]\d:[0-5]\d),   # FirstSeen
        ([1-9]\d{0,3}),                                                 # channel
        (0|-\d{1,3}),                                                   # RSSI
        (-?\?|-?\d{1,4}(?:\.\d+)?),                                     # latitude
        (-?\?|-?\d{1,4}(?:\.\d+)?),                                     # longitude
        (-?\d+(?:\.\d+)?),                                              # altitude
        (\d+(?:\.\d+)?)                                                 # accuracy
        (?:,WIFI)?                                                      # type
        ",
    )
    .expect("valid WiGLE CSV regex")
});

/// Rows the app writes for things that are not Wi-Fi networks.
fn is_non_wifi_row(line: &str) -> bool {
    line.strip_prefix(NULL_BSSID)
        .is_some_and(|rest| rest.starts_with(','))
        || line.ends_with(",CDMA")
        || line.ends_with(",GSM")
}

fn parse_coordinate(at: &str, name: &str, text: &str) -> Result<f64> {
    match text {
        "?" | "-?" => Ok(0.0),
        _ => parse_field(FORMAT, at, name, text),
    }
}

/// WiGLE CSV line adapter. Line 1 is the app's pre-header, line 2 the column header.
#[derive(Debug, Default)]
pub struct WigleCsv;

impl WigleCsv {
    /// Creates an adapter for one file.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

impl LineAdapter for WigleCsv {
    fn parse_line(&mut self, lineno: u64, line: &str) -> Result<Extracted> {
        let at = line_location(lineno);

        match lineno {
            1 => return Ok(Extracted::Skip),
            2 if !line.starts_with(HEADER) => {
                return Err(WifiTsvError::grammar(
                    FORMAT,
                    at,
                    format!("expected header \"{HEADER}\", got \"{line}\""),
                ));
            }
            2 => return Ok(Extracted::Skip),
            _ => {}
        }

        let Some(caps) = RECORD.captures(line) else {
            if is_non_wifi_row(line) {
                return Ok(Extracted::Skip);
            }
            return Err(WifiTsvError::grammar(FORMAT, at, format!("no match: {line}")));
        };

        let timestamp = utc_timestamp(&caps[3], "%Y-%m-%d %H:%M:%S").ok_or_else(|| {
            WifiTsvError::grammar(FORMAT, &at, format!("bad FirstSeen: \"{}\"", &caps[3]))
        })?;

        let altitude: f64 = parse_field(FORMAT, &at, "altitude", &caps[8])?;
        if !PLAUSIBLE_ALTITUDE.contains(&altitude) {
            return Err(WifiTsvError::grammar(FORMAT, &at, format!("altitude: \"{altitude}\"")));
        }
        let altitude = Some(altitude).filter(|&alt| alt != 0.0 && CONSTRAINTS.altitude.contains(&alt));

        let accuracy: f64 = parse_field(FORMAT, &at, "accuracy", &caps[9])?;
        if !PLAUSIBLE_ACCURACY.contains(&accuracy) {
            return Err(WifiTsvError::grammar(FORMAT, &at, format!("accuracy: \"{accuracy}\"")));
        }
        let accuracy = Some(accuracy).filter(|&acc| acc != 0.0 && CONSTRAINTS.accuracy.contains(&acc));

        let latitude = parse_coordinate(&at, "latitude", &caps[6])?;
        let longitude = parse_coordinate(&at, "longitude", &caps[7])?;
        if !CONSTRAINTS.latitude.contains(&latitude) || !CONSTRAINTS.longitude.contains(&longitude) {
            return Ok(Extracted::Unusable("coordinates out of range"));
        }

        let signal: i32 = parse_field(FORMAT, &at, "RSSI", &caps[5])?;

        let raw = RawObservation::new(canonicalize(&caps[1])?, latitude, longitude, timestamp)
            .with_ssid(&caps[2])
            .with_accuracy(accuracy)
            .with_altitude(altitude)
            .with_channel(Some(parse_field(FORMAT, &at, "channel", &caps[4])?))
            .with_signal(Some(signal).filter(|&rssi| rssi != 0));

        Ok(Extracted::Observation(raw))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::test_support::{convert_str, observation};
    use crate::adapters::Format;

    const PRE_HEADER: &str = "WigleWifi-1.4,appRelease=2.26,model=Nexus 5,release=6.0.1,device=hammerhead,display=MMB29S,board=hammerhead,brand=google";

    fn parse(line: &str) -> Result<Extracted> {
        WigleCsv::new().parse_line(3, line)
    }

    #[test]
    fn test_sample_records_match() {
        for line in [
            "00:22:6b:50:eb:05,dogtown,[WPA2-PSK-CCMP][WPS][ESS],2011-12-11 19:34:21,6,-34,37.8428930835798,-122.247731778771,46,10,WIFI",
            "00:21:7c:36:ea:a1,2WIRE493,[WPA-PSK-TKIP+CCMP][WPA2-PSK-TKIP+CCMP][ESS],2011-12-11 19:34:25,2,-84,37.8429072489962,-122.247739993036,44.2000122070312,15,WIFI",
            "d8:c7:c8:eb:0b:fa,Mozilla Mobile,[WPA2-PSK-CCMP][ESS],2011-12-12 14:25:11,157,-66,37.7896163,-122.3888664,0,38,WIFI",
            "00:24:6c:b8:a3:a2,WL-GW,[WPA2-PSK-CCMP][ESS],1969-12-31 16:00:00,4,-88,37.7877620421609,-122.383854277004,0,35.6734085083008,WIFI",
            "00:1d:e5:8c:aa:30,ResidenceInn_GUEST,[ESS],2012-05-19 10:01:07,8,-74,37.962946370244,-122.053834637627,-20.2999877929688,15,WIFI",
            "74:91:1a:26:e2:b8,St Martins Lane,[ESS],2013-03-06 10:15:21,1,0,51.5112666,-0.127997,0,500,WIFI",
            "00:16:b6:18:44:1f,TheGate 2 (open),[ESS],2013-03-06 13:25:44,11,-3,51.5090621,-0.19607366,86.5999984741211,10,WIFI",
            "44:a7:cf:30:b5:0a,L&B ON THE GO,[WPA-PSK-TKIP][ESS],1969-12-31 16:00:00,1,-65,?,-?,0,1452.03161621094,WIFI",
            "00:0f:66:18:e7:b3,Metrix,[WEP],2010-11-02 19:31:06,6,-71,38.9912224,-77.4250565,0,61",
            "04:4f:aa:2e:39:48,HarborLink - BP Wi-Fi,,2010-11-02 19:41:53,6,-100,38.991276,-77.4248229,0,61",
            "c0:c1:c0:35:2b:00,Lola's,[WPA-PSK-TKIP+CCMP][WPA2-PSK-TKIP+CCMP][WPS][ESS],1969-12-31 16:00:00,11,-82,-?,-?,0,879.535034179688,WIFI",
            "c8:7b:5b:c1:dd:04,molecular_biology,[WPA-PSK-TKIP+CCMP],1970-01-01 08:00:00,10,-92,-660.465344160003,-379.070096429989,0,10818.158203125,WIFI",
            "00:1d:71:e3:8a:4e,Guest,[ESS],2013-09-11 19:11:59,5580,-83,48.52605465,9.05918653,380.700012207031,4,WIFI",
        ] {
            assert!(RECORD.is_match(line), "{line}");
        }
    }

    #[test]
    fn test_parse_record() {
        let raw = observation(
            parse("00:21:7c:36:ea:a1,2WIRE493,[WPA-PSK-TKIP+CCMP][WPA2-PSK-TKIP+CCMP][ESS],2011-12-11 19:34:25,2,-84,37.8429072489962,-122.247739993036,44.2000122070312,15,WIFI")
                .unwrap(),
        );
        assert_eq!(raw.bssid, "00:21:7c:36:ea:a1");
        assert_eq!(raw.ssid, b"2WIRE493");
        assert_eq!(raw.timestamp, 1_323_632_065);
        assert_eq!(raw.channel, Some(2));
        assert_eq!(raw.signal, Some(-84));
        assert_eq!(raw.altitude, Some(44.200_012_207_031_2));
        assert_eq!(raw.accuracy, Some(15.0));
    }

    #[test]
    fn test_zero_means_unknown() {
        let raw = observation(
            parse("74:91:1a:26:e2:b8,St Martins Lane,[ESS],2013-03-06 10:15:21,1,0,51.5112666,-0.127997,0,500,WIFI")
                .unwrap(),
        );
        assert_eq!(raw.signal, None);
        assert_eq!(raw.altitude, None);
        assert_eq!(raw.accuracy, Some(500.0));
    }

    #[test]
    fn test_unknown_position_is_null_island() {
        let raw = observation(
            parse("44:a7:cf:30:b5:0a,L&B ON THE GO,[WPA-PSK-TKIP][ESS],1969-12-31 16:00:00,1,-65,?,-?,0,1452.03161621094,WIFI")
                .unwrap(),
        );
        assert_eq!((raw.latitude, raw.longitude), (0.0, 0.0));
        assert_eq!(raw.timestamp, -28_800);
    }

    #[test]
    fn test_out_of_range_position_unusable() {
        let extracted = parse("c8:7b:5b:c1:dd:04,molecular_biology,[WPA-PSK-TKIP+CCMP],1970-01-01 08:00:00,10,-92,-660.465344160003,-379.070096429989,0,10818.158203125,WIFI").unwrap();
        assert_eq!(extracted, Extracted::Unusable("coordinates out of range"));
    }

    #[test]
    fn test_implausible_values_are_fatal() {
        let err = parse("00:0f:66:18:e7:b3,Metrix,[WEP],2010-11-02 19:31:06,6,-71,38.9912224,-77.4250565,12000,61").unwrap_err();
        assert_eq!(err.to_string(), "wigle-csv: line 3: altitude: \"12000\"");

        let err = parse("00:0f:66:18:e7:b3,Metrix,[WEP],2010-11-02 19:31:06,6,-71,38.9912224,-77.4250565,0,500000").unwrap_err();
        assert_eq!(err.to_string(), "wigle-csv: line 3: accuracy: \"500000\"");
    }

    #[test]
    fn test_out_of_band_values_clamped() {
        let raw = observation(
            parse("00:0f:66:18:e7:b3,Metrix,[WEP],2010-11-02 19:31:06,6,-71,38.9912224,-77.4250565,9000,25000").unwrap(),
        );
        assert_eq!(raw.altitude, None);
        assert_eq!(raw.accuracy, None);
    }

    #[test]
    fn test_cell_rows_skipped() {
        assert_eq!(
            parse("00:00:00:00:00:00,,[ESS],2013-03-06 10:15:21,0,-50,51.5,-0.12,0,5,WIFI").unwrap(),
            Extracted::Skip
        );
        assert_eq!(
            parse("310410_56978_2731527,AT&T,LTE;us,2013-03-06 10:15:21,0,-113,51.5,-0.12,0,5,GSM").unwrap(),
            Extracted::Skip
        );
        assert!(parse("310410_56978_2731527,AT&T,LTE;us,2013-03-06 10:15:21,0,-113,51.5,-0.12,0,5,LTE")
            .unwrap_err()
            .is_grammar_error());
    }

    #[test]
    fn test_header_lines() {
        let mut adapter = WigleCsv::new();
        assert_eq!(adapter.parse_line(1, PRE_HEADER).unwrap(), Extracted::Skip);
        assert_eq!(adapter.parse_line(2, HEADER).unwrap(), Extracted::Skip);
        assert!(adapter.parse_line(2, "MAC,SSID").unwrap_err().is_grammar_error());
    }

    #[test]
    fn test_convert_file() {
        let input = format!(
            "{PRE_HEADER}\n{HEADER}\n\
             00:22:6b:50:eb:05,dogtown,[WPA2-PSK-CCMP][WPS][ESS],2011-12-11 19:34:21,6,-34,37.8428930835798,-122.247731778771,46,10,WIFI\n\
             00:21:e8:cc:97:68,Sprint MiFi2200 768 Secure,[WPA2-PSK-CCMP],2010-11-02 19:35:40,11,-88,38.9912728,-77.4247608,0,36\n\
             00:24:6c:b8:a3:a2,WL-GW,[WPA2-PSK-CCMP][ESS],1969-12-31 16:00:00,4,-88,37.7877620421609,-122.383854277004,0,35.6734085083008,WIFI\n"
        );
        let (out, stats) = convert_str(Format::WigleCsv, &input).unwrap();
        assert_eq!(
            out,
            "00:22:6b:50:eb:05\t1323632061\t37.842893\t-122.247732\t10\t46\t\t6\t-34\tdogtown\n\
             00:24:6c:b8:a3:a2\t0\t37.787762\t-122.383854\t35.6734085083008\t\t\t4\t-88\tWL-GW\n"
        );
        assert_eq!(stats.mobile_ssid, 1);
        assert_eq!(stats.skipped, 2);
    }
}
