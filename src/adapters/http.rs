//! HTTP report transport.
//!
//! One measurement, one POST: a fresh connection per exchange keeps the
//! adapter stateless and means a half-dead TCP session can never outlive
//! the report that noticed it. The `Content-Type: application/json`
//! header lives here — the protocol module only supplies url and body.
//!
//! The simulation backend answers with a scripted status so host tests
//! can drive every row of the actuation table.

#[cfg(not(target_os = "espidf"))]
use log::info;

use crate::report::{ReportTransport, TransportError};

#[cfg(target_os = "espidf")]
use embedded_svc::{
    http::client::Client as HttpClient,
    http::Status,
    io::Write,
};
#[cfg(target_os = "espidf")]
use esp_idf_svc::http::client::{Configuration as HttpConfiguration, EspHttpConnection};

pub struct HttpReportTransport {
    #[cfg(not(target_os = "espidf"))]
    sim_response: Result<u16, TransportError>,
    #[cfg(not(target_os = "espidf"))]
    sim_posts: u32,
}

impl Default for HttpReportTransport {
    fn default() -> Self {
        Self::new()
    }
}

impl HttpReportTransport {
    pub fn new() -> Self {
        Self {
            #[cfg(not(target_os = "espidf"))]
            sim_response: Ok(200),
            #[cfg(not(target_os = "espidf"))]
            sim_posts: 0,
        }
    }

    /// Script the next responses (host tests).
    #[cfg(not(target_os = "espidf"))]
    pub fn sim_respond_with(&mut self, response: Result<u16, TransportError>) {
        self.sim_response = response;
    }

    #[cfg(not(target_os = "espidf"))]
    pub fn sim_post_count(&self) -> u32 {
        self.sim_posts
    }
}

impl ReportTransport for HttpReportTransport {
    #[cfg(target_os = "espidf")]
    fn post_json(&mut self, url: &str, body: &str) -> Result<u16, TransportError> {
        let connection = EspHttpConnection::new(&HttpConfiguration {
            timeout: Some(core::time::Duration::from_secs(10)),
            ..Default::default()
        })
        .map_err(|_| TransportError::Unreachable)?;
        let mut client = HttpClient::wrap(connection);

        let headers = [("Content-Type", "application/json")];
        let mut request = client
            .post(url, &headers)
            .map_err(|_| TransportError::Unreachable)?;
        request
            .write_all(body.as_bytes())
            .map_err(|_| TransportError::Io)?;
        let response = request.submit().map_err(|_| TransportError::Io)?;
        Ok(response.status())
    }

    #[cfg(not(target_os = "espidf"))]
    fn post_json(&mut self, url: &str, body: &str) -> Result<u16, TransportError> {
        self.sim_posts += 1;
        info!("http(sim): POST {url} {body} → {:?}", self.sim_response);
        self.sim_response
    }
}
