//! Command-line tools versions
//!
//! Release archives are named after a long build number, while the installed
//! `source.properties` and the `cmdline-tools/<version>` directory use the
//! short version.

/// Known release build numbers and their short versions
pub const KNOWN_RELEASES: &[(&str, &str)] = &[
    ("7583922", "6.0"),
    ("8092744", "7.0"),
    ("8512546", "8.0"),
    ("9123335", "9.0"),
    ("9477386", "10.0"),
    ("9862592", "10.0"),
    ("10406996", "11.0"),
    ("11076708", "12.0"),
    ("11479570", "13.0"),
    ("12266719", "16.0"),
    ("13114758", "19.0"),
];

/// Short version for a release build number
///
/// Unknown build numbers are assumed to already be short versions and are
/// returned unchanged, so newer releases work without a table update.
pub fn resolve(release_id: &str) -> &str {
    KNOWN_RELEASES
        .iter()
        .find(|(release, _)| *release == release_id)
        .map(|(_, short)| *short)
        .unwrap_or(release_id)
}
