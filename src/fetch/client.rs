use std::time::Duration;

use async_trait::async_trait;
use tracing::debug;

use super::SearchRequest;
use crate::destinations::Destination;
use crate::error::ApiError;

pub const DESTINATION_PRICE_PATH: &str = "/api/v1/flights/GetDestinationPrice";
pub const DEPARTURE_AIRPORT_PATH: &str = "/api/v1/airports/GetAirportCoordinates";

/// Backend the map talks to
#[async_trait]
pub trait FlightApi: Send + Sync + 'static {
    /// Destinations with prices for the request's area, departure and dates
    async fn destination_prices(&self, request: &SearchRequest) -> Result<Vec<Destination>, ApiError>;

    /// Coordinates of a departure airport. Anything but `[lat, lng]` means
    /// the code could not be resolved.
    async fn departure_airport(&self, code: &str) -> Result<Option<Vec<f64>>, ApiError>;
}

/// HTTP transport against the flight price service
pub struct HttpFlightApi {
    http: reqwest::Client,
    base_url: String,
}

impl HttpFlightApi {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, ApiError> {
        let http = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    async fn get_json<T>(&self, path: &str, query: &[(&str, String)]) -> Result<T, ApiError>
    where
        T: serde::de::DeserializeOwned,
    {
        let url = format!("{}{}", self.base_url, path);
        debug!(%url, ?query, "GET");
        let resp = self
            .http
            .get(&url)
            .query(query)
            .send()
            .await?
            .error_for_status()?;
        let mut body = resp.bytes().await?.to_vec();
        Ok(simd_json::serde::from_slice(&mut body)?)
    }
}

#[async_trait]
impl FlightApi for HttpFlightApi {
    async fn destination_prices(&self, request: &SearchRequest) -> Result<Vec<Destination>, ApiError> {
        self.get_json(DESTINATION_PRICE_PATH, &request.query_pairs()).await
    }

    async fn departure_airport(&self, code: &str) -> Result<Option<Vec<f64>>, ApiError> {
        self.get_json(DEPARTURE_AIRPORT_PATH, &[("code", code.to_string())])
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fetch::{DatesFilter, TripDuration};
    use crate::geo::{Bounds, LatLng};
    use mockito::Matcher;

    fn request() -> SearchRequest {
        SearchRequest {
            departure_airport_id: Some("SYD".into()),
            search_area: Bounds::new(LatLng::new(-10.0, 110.0), LatLng::new(-45.0, 155.0)),
            dates: DatesFilter {
                month: Some(7),
                duration: TripDuration::Weekend,
            },
        }
    }

    #[tokio::test]
    async fn test_destination_prices_sends_search_area() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", DESTINATION_PRICE_PATH)
            .match_query(Matcher::AllOf(vec![
                Matcher::UrlEncoded("departureAirportId".into(), "SYD".into()),
                Matcher::UrlEncoded("nwLng".into(), "110".into()),
                Matcher::UrlEncoded("month".into(), "7".into()),
            ]))
            .with_header("content-type", "application/json")
            .with_body(r#"[{"cityName":"Hobart","destAirportCode":"HBA","lat":-42.8,"lng":147.5,"price":129.0,"personalPriorityIdx":1.0}]"#)
            .create_async()
            .await;

        let api = HttpFlightApi::new(&server.url(), Duration::from_secs(5)).unwrap();
        let found = api.destination_prices(&request()).await.unwrap();
        mock.assert_async().await;
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].dest_airport_code, "HBA");
    }

    #[tokio::test]
    async fn test_server_error_maps_to_status() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("GET", DESTINATION_PRICE_PATH)
            .match_query(Matcher::Any)
            .with_status(503)
            .create_async()
            .await;

        let api = HttpFlightApi::new(&server.url(), Duration::from_secs(5)).unwrap();
        let err = api.destination_prices(&request()).await.unwrap_err();
        assert_eq!(err, ApiError::Status(503));
    }

    #[tokio::test]
    async fn test_departure_airport_lookup() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("GET", DEPARTURE_AIRPORT_PATH)
            .match_query(Matcher::UrlEncoded("code".into(), "MEL".into()))
            .with_body("[-37.67, 144.84]")
            .create_async()
            .await;

        let api = HttpFlightApi::new(&server.url(), Duration::from_secs(5)).unwrap();
        let coords = api.departure_airport("MEL").await.unwrap();
        assert_eq!(coords, Some(vec![-37.67, 144.84]));
    }

    #[tokio::test]
    async fn test_garbage_body_is_decode_error() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("GET", DESTINATION_PRICE_PATH)
            .match_query(Matcher::Any)
            .with_body("<html>oops</html>")
            .create_async()
            .await;

        let api = HttpFlightApi::new(&server.url(), Duration::from_secs(5)).unwrap();
        let err = api.destination_prices(&request()).await.unwrap_err();
        assert!(matches!(err, ApiError::Decode(_)));
    }
}
