//! Mobile hotspot heuristic.
//!
//! Phones, tablets, pocket routers and vehicle wifi move around, so a sighting of one says
//! nothing about where that access point "is". They are recognized purely by naming convention.
//! The lists below are reference data collected from real survey logs.
//!
//! Matching is literal and case-sensitive: no wildcards, no scoring. Any single rule hit is
//! enough.

/// SSIDs starting with one of these are mobile.
pub const SSID_PREFIXES: &[&str] = &[
    "ASUS",
    "AndroidAP",
    "AndroidTether",
    "Galaxy Note",
    "Galaxy S",
    "Galaxy Tab",
    "HTC ",
    "HelloMoto",
    "LG VS910 4G",
    "MIFI",
    "MiFi",
    "Mifi",
    "MOBILE",
    "Mobile",
    "PhoneAP",
    "SAMSUNG",
    "SCH-I",
    "SPRINT",
    "Samsung",
    "Sprint",
    "Verizon",
    "VirginMobile",
    "barnacle", // Android Barnacle Wifi Tether
    "docomo",
    "hellomoto",
    "iPad",
    "iPhone",
    "ipad",
    "mifi",
    "mobile",
    "myLGNet",
    "myTouch 4G Hotspot",
    "samsung",
    "sprint",
    "webOS Network",
    // Transportation
    "AIRBUS FREE WIFI",
    "AmtrakConnect",
    "GBUS",
    "GBusWifi",
    "SF Shuttle Wireless",
    "SST-PR-1", // service van hotspot
    "Shuttle",
    "Trimble ",
    "VTA Free Wi-Fi",
    "ac_transit_wifi_bus",
    "airbusA380",
    "amtrak_",
    "shuttle",
];

/// SSIDs ending with one of these are mobile (or opted out of mapping).
pub const SSID_SUFFIXES: &[&str] = &[
    " ASUS",
    "-ASUS",
    "_ASUS",
    "MIFI",
    "MiFi",
    "Mifi",
    "MyWi",
    " Shuttle",
    "Tether",
    "iPad",
    "iPhone",
    "ipad",
    "iphone",
    "mifi",
    "tether",
    // Google's SSID opt-out
    "_nomap",
];

/// SSIDs containing one of these anywhere are mobile.
pub const SSID_SUBSTRINGS: &[&str] = &["MacBook", "MiFi", "Mifi"];

/// Which rule class matched, and on which table entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MobileMatch {
    /// The SSID starts with this entry.
    Prefix(&'static str),
    /// The SSID ends with this entry.
    Suffix(&'static str),
    /// The SSID contains this entry.
    Substring(&'static str),
}

/// The three disjoint rule classes of the heuristic.
#[derive(Debug, Clone, Copy)]
pub struct MobileSsidTable {
    /// Prefix rules.
    pub prefixes: &'static [&'static str],
    /// Suffix rules.
    pub suffixes: &'static [&'static str],
    /// Substring rules.
    pub substrings: &'static [&'static str],
}

impl MobileSsidTable {
    /// The curated table shipped with the converter.
    pub const CURATED: Self = Self {
        prefixes: SSID_PREFIXES,
        suffixes: SSID_SUFFIXES,
        substrings: SSID_SUBSTRINGS,
    };

    /// Returns the first rule that matches `ssid`, checking prefixes, then suffixes, then
    /// substrings. Comparison is byte-wise. An empty SSID never matches.
    #[must_use]
    pub fn first_match(&self, ssid: impl AsRef<[u8]>) -> Option<MobileMatch> {
        let ssid = ssid.as_ref();
        if ssid.is_empty() {
            return None;
        }

        if let Some(&p) = self.prefixes.iter().find(|p| ssid.starts_with(p.as_bytes())) {
            return Some(MobileMatch::Prefix(p));
        }
        if let Some(&s) = self.suffixes.iter().find(|s| ssid.ends_with(s.as_bytes())) {
            return Some(MobileMatch::Suffix(s));
        }
        self.substrings
            .iter()
            .find(|s| contains(ssid, s.as_bytes()))
            .map(|&s| MobileMatch::Substring(s))
    }

    /// Returns `true` if any rule matches `ssid`.
    #[must_use]
    pub fn matches(&self, ssid: impl AsRef<[u8]>) -> bool {
        self.first_match(ssid).is_some()
    }
}

fn contains(haystack: &[u8], needle: &[u8]) -> bool {
    needle.is_empty() || haystack.windows(needle.len()).any(|window| window == needle)
}

/// Returns `true` if `ssid` looks like a mobile or transient hotspot.
#[must_use]
pub fn is_mobile(ssid: &str) -> bool {
    crate::constraints::CONSTRAINTS.mobile_ssids.matches(ssid)
}
