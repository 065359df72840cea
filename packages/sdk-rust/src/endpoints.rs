//! Static table of TourCMS endpoints
//!
//! Every endpoint is a row describing its paths, verb, identifier field and
//! body handling. [`EndpointCall`] turns a row plus caller arguments into a
//! [`RequestSpec`] for the dispatcher.

use std::fmt;
use std::str::FromStr;

use crate::error::{SdkError, SdkResult};
use crate::params::Params;
use crate::request::RequestSpec;
use crate::signer::Verb;

/// Named TourCMS endpoints. Discriminants index [`ENDPOINTS`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Endpoint {
    ApiRateLimitStatus,
    ListChannels,
    ShowChannel,
    SearchTours,
    SearchHotelsRange,
    SearchHotelsSpecific,
    ListTours,
    ListTourImages,
    ShowTour,
    ShowTourDepartures,
    ShowTourFreesale,
    ShowTourDatesAndDeals,
    CheckAvailability,
    StartNewBooking,
    CommitNewBooking,
    CancelBooking,
    DeleteBooking,
    ShowBooking,
}

/// Identifier field merged into the query string
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Identifier {
    pub key: &'static str,
    /// Used when the caller supplies no identifier. `None` makes it required.
    pub default: Option<&'static str>,
}

/// How an endpoint treats the request body
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BodyKind {
    None,
    /// Caller-supplied XML document, required
    Payload,
    /// POST with an empty body
    Empty,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EndpointSpec {
    pub endpoint: Endpoint,
    pub name: &'static str,
    /// Path used for channel 0
    pub marketplace_path: Option<&'static str>,
    /// Path used for a specific channel
    pub channel_path: Option<&'static str>,
    pub verb: Verb,
    pub identifier: Option<Identifier>,
    pub body: BodyKind,
}

const fn get(
    endpoint: Endpoint,
    name: &'static str,
    marketplace_path: Option<&'static str>,
    channel_path: Option<&'static str>,
    identifier: Option<Identifier>,
) -> EndpointSpec {
    EndpointSpec {
        endpoint,
        name,
        marketplace_path,
        channel_path,
        verb: Verb::Get,
        identifier,
        body: BodyKind::None,
    }
}

const fn post(
    endpoint: Endpoint,
    name: &'static str,
    channel_path: &'static str,
    identifier: Option<Identifier>,
    body: BodyKind,
) -> EndpointSpec {
    EndpointSpec {
        endpoint,
        name,
        marketplace_path: None,
        channel_path: Some(channel_path),
        verb: Verb::Post,
        identifier,
        body,
    }
}

const TOUR_ID: Option<Identifier> = Some(Identifier { key: "id", default: None });
const BOOKING_ID: Option<Identifier> = Some(Identifier { key: "booking_id", default: None });
const SINGLE_TOUR_ID: Option<Identifier> = Some(Identifier {
    key: "single_tour_id",
    default: Some(""),
});

pub const ENDPOINTS: [EndpointSpec; 18] = [
    get(
        Endpoint::ApiRateLimitStatus,
        "api_rate_limit_status",
        Some("/api/rate_limit_status.xml"),
        Some("/api/rate_limit_status.xml"),
        None,
    ),
    get(Endpoint::ListChannels, "list_channels", Some("/p/channels/list.xml"), None, None),
    get(Endpoint::ShowChannel, "show_channel", None, Some("/c/channel/show.xml"), None),
    get(
        Endpoint::SearchTours,
        "search_tours",
        Some("/p/tours/search.xml"),
        Some("/c/tours/search.xml"),
        None,
    ),
    get(
        Endpoint::SearchHotelsRange,
        "search_hotels_range",
        Some("/p/hotels/search_range.xml"),
        Some("/c/hotels/search_range.xml"),
        SINGLE_TOUR_ID,
    ),
    get(
        Endpoint::SearchHotelsSpecific,
        "search_hotels_specific",
        Some("/p/hotels/search-avail.xml"),
        Some("/c/hotels/search-avail.xml"),
        SINGLE_TOUR_ID,
    ),
    get(
        Endpoint::ListTours,
        "list_tours",
        Some("/p/tours/list.xml"),
        Some("/c/tours/list.xml"),
        None,
    ),
    get(
        Endpoint::ListTourImages,
        "list_tour_images",
        Some("/p/tours/images/list.xml"),
        Some("/c/tours/images/list.xml"),
        None,
    ),
    get(Endpoint::ShowTour, "show_tour", None, Some("/c/tour/show.xml"), TOUR_ID),
    get(
        Endpoint::ShowTourDepartures,
        "show_tour_departures",
        None,
        Some("/c/tour/datesprices/dep/show.xml"),
        TOUR_ID,
    ),
    get(
        Endpoint::ShowTourFreesale,
        "show_tour_freesale",
        None,
        Some("/c/tour/datesprices/freesale/show.xml"),
        TOUR_ID,
    ),
    get(
        Endpoint::ShowTourDatesAndDeals,
        "show_tour_datesanddeals",
        None,
        Some("/c/tour/datesprices/datesndeals/search.xml"),
        TOUR_ID,
    ),
    get(
        Endpoint::CheckAvailability,
        "check_availability",
        None,
        Some("/c/tour/datesprices/checkavail.xml"),
        TOUR_ID,
    ),
    post(
        Endpoint::StartNewBooking,
        "start_new_booking",
        "/c/booking/new/start.xml",
        None,
        BodyKind::Payload,
    ),
    post(
        Endpoint::CommitNewBooking,
        "commit_new_booking",
        "/c/booking/new/commit.xml",
        None,
        BodyKind::Payload,
    ),
    post(
        Endpoint::CancelBooking,
        "cancel_booking",
        "/c/booking/cancel.xml",
        None,
        BodyKind::Payload,
    ),
    post(
        Endpoint::DeleteBooking,
        "delete_booking",
        "/c/booking/delete.xml",
        BOOKING_ID,
        BodyKind::Empty,
    ),
    get(Endpoint::ShowBooking, "show_booking", None, Some("/c/booking/show.xml"), BOOKING_ID),
];

/// Alternative names accepted by [`Endpoint::from_name`]
const ALIASES: &[(&str, Endpoint)] = &[("datesndeals", Endpoint::ShowTourDatesAndDeals)];

impl Endpoint {
    pub fn spec(self) -> &'static EndpointSpec {
        &ENDPOINTS[self as usize]
    }

    pub fn name(self) -> &'static str {
        self.spec().name
    }

    pub fn all() -> impl Iterator<Item = Endpoint> {
        ENDPOINTS.iter().map(|spec| spec.endpoint)
    }

    /// Look up an endpoint by its snake_case name or an alias.
    pub fn from_name(name: &str) -> Option<Endpoint> {
        ENDPOINTS
            .iter()
            .find(|spec| spec.name == name)
            .map(|spec| spec.endpoint)
            .or_else(|| {
                ALIASES
                    .iter()
                    .find(|(alias, _)| *alias == name)
                    .map(|(_, endpoint)| *endpoint)
            })
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Endpoint {
    type Err = SdkError;

    fn from_str(s: &str) -> SdkResult<Self> {
        Endpoint::from_name(s)
            .ok_or_else(|| SdkError::InvalidRequest(format!("Unknown endpoint: {}", s)))
    }
}

impl EndpointSpec {
    /// Resolve the path and effective channel for a call.
    ///
    /// Marketplace-only endpoints always go out with channel 0; channel-only
    /// endpoints refuse channel 0.
    pub fn resolve(&self, channel: u64) -> SdkResult<(&'static str, u64)> {
        match (channel, self.marketplace_path, self.channel_path) {
            (0, Some(path), _) => Ok((path, 0)),
            (0, None, _) => Err(SdkError::InvalidRequest(format!(
                "{} requires a channel id",
                self.name
            ))),
            (_, _, Some(path)) => Ok((path, channel)),
            (_, Some(path), None) => Ok((path, 0)),
            (_, None, None) => Err(SdkError::InvalidRequest(format!(
                "{} has no path configured",
                self.name
            ))),
        }
    }
}

/// Caller arguments for one endpoint invocation
///
/// # Example
/// ```
/// use tourcms_sdk::{Endpoint, EndpointCall};
/// let spec = EndpointCall::new(Endpoint::ShowTour)
///     .channel(3930)
///     .id("6")
///     .param("show_options", "1")
///     .into_request_spec()
///     .unwrap();
/// assert_eq!(spec.path_with_query(), "/c/tour/show.xml?id=6&show_options=1");
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EndpointCall {
    pub endpoint: Endpoint,
    pub channel: u64,
    pub identifier: Option<String>,
    pub params: Params,
    pub body: Option<Vec<u8>>,
}

impl EndpointCall {
    pub fn new(endpoint: Endpoint) -> Self {
        Self {
            endpoint,
            channel: 0,
            identifier: None,
            params: Params::new(),
            body: None,
        }
    }

    pub fn channel(mut self, channel: u64) -> Self {
        self.channel = channel;
        self
    }

    /// Tour id, booking id or single tour id, depending on the endpoint
    pub fn id(mut self, identifier: impl Into<String>) -> Self {
        self.identifier = Some(identifier.into());
        self
    }

    pub fn params(mut self, params: Params) -> Self {
        self.params = params;
        self
    }

    pub fn param(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.params.insert(key, value);
        self
    }

    pub fn body(mut self, body: impl Into<Vec<u8>>) -> Self {
        self.body = Some(body.into());
        self
    }

    /// Validate against the endpoint table and build the dispatcher request.
    ///
    /// # Errors
    ///
    /// [`SdkError::InvalidRequest`] for a missing channel, identifier or body,
    /// or a body passed to an endpoint that takes none.
    pub fn into_request_spec(self) -> SdkResult<RequestSpec> {
        let spec = self.endpoint.spec();
        let (path, channel) = spec.resolve(self.channel)?;

        let params = match spec.identifier {
            Some(identifier) => {
                let value = self
                    .identifier
                    .or_else(|| identifier.default.map(str::to_string))
                    .ok_or_else(|| {
                        SdkError::InvalidRequest(format!(
                            "{} requires `{}`",
                            spec.name, identifier.key
                        ))
                    })?;
                self.params.merge_identifier(identifier.key, value)
            }
            None => self.params,
        };

        let body = match (spec.body, self.body) {
            (BodyKind::Payload, Some(body)) => Some(body),
            (BodyKind::Payload, None) => {
                return Err(SdkError::InvalidRequest(format!(
                    "{} requires a request body",
                    spec.name
                )))
            }
            (BodyKind::Empty, None) => Some(Vec::new()),
            (BodyKind::None, None) => None,
            (_, Some(_)) => {
                return Err(SdkError::InvalidRequest(format!(
                    "{} does not take a request body",
                    spec.name
                )))
            }
        };

        Ok(RequestSpec {
            path: path.to_string(),
            channel,
            params,
            body,
            verb: spec.verb,
        })
    }
}

impl From<Endpoint> for EndpointCall {
    fn from(endpoint: Endpoint) -> Self {
        EndpointCall::new(endpoint)
    }
}
