use std::time::Duration;

use serde::Deserialize;

use crate::models::Coords;

#[derive(Deserialize, Debug)]
struct GeoIpResponse {
    status: String,
    #[serde(default)]
    lat: f64,
    #[serde(default)]
    lon: f64,
}

/// One-shot IP-based position lookup, used to center the map on startup.
/// Any failure (offline, refused, malformed) is reported on stderr and
/// returns `None`; the caller decides how to degrade.
pub fn current_position() -> Option<Coords> {
    let client = reqwest::blocking::Client::new();
    let url = "http://ip-api.com/json/?fields=status,lat,lon";

    match client.get(url).timeout(Duration::from_secs(5)).send() {
        Ok(response) => match response.json::<GeoIpResponse>() {
            Ok(geo) if geo.status == "success" => Some([geo.lat, geo.lon]),
            Ok(geo) => {
                eprintln!("Geolocation lookup refused: {:?}", geo.status);
                None
            }
            Err(e) => {
                eprintln!("Error parsing geolocation response: {}", e);
                None
            }
        },
        Err(e) => {
            eprintln!("Error fetching geolocation: {}", e);
            None
        }
    }
}
