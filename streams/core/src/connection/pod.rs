//! Pod REST Connection
//!
//! [`Connection`] backed by a pod's REST API.
//!
//! # Pod API
//!
//! - `POST /pod/v1/streams/list?skip=&limit=` - List streams matching a filter
//! - `GET /pod/v2/streams/{id}/info` - Stream descriptor
//! - `GET /pod/v2/room/{id}/membership/list` - Room members
//! - `GET /pod/v3/users?uid=&local=false` - User lookup by id
//!
//! Requests carry the `sessionToken` and `keyManagerToken` headers from
//! configuration. Obtaining those tokens is out of scope here.
//!
//! Lookups that the pod answers with 400, 403 or 404 are reported as absent
//! (the id is malformed, hidden from the session, or does not exist). Every
//! other non-success status is a [`ConnectionError::Status`].

use std::collections::HashMap;
use std::fmt;

use async_trait::async_trait;
use futures::future::try_join_all;
use reqwest::{Method, RequestBuilder, Response, StatusCode, Url};
use serde::de::DeserializeOwned;
use serde::Deserialize;

use super::traits::{Connection, ConnectionError, ConnectionId};
use crate::config::PodConfig;
use crate::model::{NativeStreamDescriptor, NativeUser, StreamFilter, StreamId, UserId};
use crate::projection::project;

/// Maximum ids per user lookup request
const USER_LOOKUP_CHUNK: usize = 100;

/// Statuses that mean "no such resource for this session"
const ABSENT_STATUSES: [StatusCode; 3] = [
    StatusCode::BAD_REQUEST,
    StatusCode::FORBIDDEN,
    StatusCode::NOT_FOUND,
];

#[derive(Deserialize)]
struct RoomMember {
    id: UserId,
}

#[derive(Deserialize)]
struct UserList {
    #[serde(default)]
    users: Vec<NativeUser>,
}

/// Pod REST client
#[derive(Clone)]
pub struct PodConnection {
    /// Identity for per-connection caches
    id: ConnectionId,
    /// Pod base URL
    base_url: Url,
    /// Session token header value
    session_token: Option<String>,
    /// Key manager token header value
    key_manager_token: Option<String>,
    /// Streams requested per listing page
    page_size: usize,
    /// HTTP client
    http_client: reqwest::Client,
}

impl PodConnection {
    /// Create a connection from configuration
    ///
    /// # Errors
    ///
    /// Returns [`ConnectionError::InvalidUrl`] if the pod URL cannot be used as
    /// an API base, or [`ConnectionError::Http`] if the HTTP client cannot be
    /// built.
    pub fn new(config: &PodConfig) -> Result<Self, ConnectionError> {
        let base_url = Url::parse(&config.pod_url)
            .map_err(|e| ConnectionError::InvalidUrl(format!("{}: {e}", config.pod_url)))?;
        if base_url.cannot_be_a_base() {
            return Err(ConnectionError::InvalidUrl(config.pod_url.clone()));
        }

        let http_client = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()?;

        let connection = Self {
            id: ConnectionId::new(),
            base_url,
            session_token: config.session_token.clone(),
            key_manager_token: config.key_manager_token.clone(),
            page_size: config.page_size.max(1),
            http_client,
        };

        tracing::debug!(
            connection = %connection.id,
            pod = %connection.base_url,
            page_size = connection.page_size,
            "Created pod connection"
        );

        Ok(connection)
    }

    /// Get the pod base URL
    #[must_use]
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Build an endpoint URL from path segments (each segment is escaped)
    fn endpoint(&self, segments: &[&str]) -> Url {
        let mut url = self.base_url.clone();
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments);
        }
        url
    }

    /// Start a request with session headers attached
    fn request(&self, method: Method, url: Url) -> RequestBuilder {
        let mut request = self.http_client.request(method, url);
        if let Some(ref token) = self.session_token {
            request = request.header("sessionToken", token);
        }
        if let Some(ref token) = self.key_manager_token {
            request = request.header("keyManagerToken", token);
        }
        request
    }

    /// Send a request whose target must exist
    async fn fetch<T: DeserializeOwned>(
        &self,
        request: RequestBuilder,
    ) -> Result<T, ConnectionError> {
        let response = request.send().await?;
        decode(response).await
    }

    /// Send a lookup; absent-class statuses yield `None`
    async fn fetch_optional<T: DeserializeOwned>(
        &self,
        request: RequestBuilder,
    ) -> Result<Option<T>, ConnectionError> {
        let response = request.send().await?;
        let status = response.status();
        if ABSENT_STATUSES.contains(&status) {
            tracing::debug!(
                connection = %self.id,
                status = status.as_u16(),
                url = %response.url(),
                "Pod reported resource absent"
            );
            return Ok(None);
        }
        decode(response).await.map(Some)
    }

    /// Member ids of a room, in pod order
    async fn room_member_ids(
        &self,
        stream_id: &StreamId,
    ) -> Result<Vec<UserId>, ConnectionError> {
        let url = self.endpoint(&["pod", "v2", "room", stream_id.as_str(), "membership", "list"]);
        let members: Option<Vec<RoomMember>> =
            self.fetch_optional(self.request(Method::GET, url)).await?;
        Ok(members
            .unwrap_or_default()
            .into_iter()
            .map(|member| member.id)
            .collect())
    }

    /// Look up users, returning them in the order of `ids`
    ///
    /// Ids the pod does not return are skipped.
    async fn users_by_id(&self, ids: &[UserId]) -> Result<Vec<NativeUser>, ConnectionError> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let lookups = ids
            .chunks(USER_LOOKUP_CHUNK)
            .map(|chunk| self.user_chunk(chunk));
        let found: HashMap<UserId, NativeUser> = try_join_all(lookups)
            .await?
            .into_iter()
            .flatten()
            .map(|user| (user.id.clone(), user))
            .collect();

        if found.len() < ids.len() {
            tracing::debug!(
                connection = %self.id,
                requested = ids.len(),
                found = found.len(),
                "Some stream members could not be looked up"
            );
        }

        Ok(ids.iter().filter_map(|id| found.get(id).cloned()).collect())
    }

    async fn user_chunk(&self, ids: &[UserId]) -> Result<Vec<NativeUser>, ConnectionError> {
        let uid = ids
            .iter()
            .map(UserId::as_str)
            .collect::<Vec<_>>()
            .join(",");
        let request = self
            .request(Method::GET, self.endpoint(&["pod", "v3", "users"]))
            .query(&[("uid", uid.as_str()), ("local", "false")]);
        let list: Option<UserList> = self.fetch_optional(request).await?;
        Ok(list.map(|list| list.users).unwrap_or_default())
    }
}

/// Decode a success body, or turn the status into an error
async fn decode<T: DeserializeOwned>(response: Response) -> Result<T, ConnectionError> {
    let status = response.status();
    let body = response.text().await?;
    if !status.is_success() {
        return Err(ConnectionError::Status {
            status: status.as_u16(),
            body,
        });
    }
    Ok(serde_json::from_str(&body)?)
}

impl fmt::Debug for PodConnection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PodConnection")
            .field("id", &self.id)
            .field("base_url", &self.base_url.as_str())
            .field("page_size", &self.page_size)
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl Connection for PodConnection {
    fn connection_id(&self) -> ConnectionId {
        self.id
    }

    async fn list_streams(
        &self,
        filter: &StreamFilter,
    ) -> Result<Vec<Option<NativeStreamDescriptor>>, ConnectionError> {
        let url = self.endpoint(&["pod", "v1", "streams", "list"]);
        let mut streams: Vec<Option<NativeStreamDescriptor>> = Vec::new();

        // Page until the pod returns a short page
        loop {
            let request = self
                .request(Method::POST, url.clone())
                .query(&[("skip", streams.len()), ("limit", self.page_size)])
                .json(filter);
            let page: Vec<Option<NativeStreamDescriptor>> = self.fetch(request).await?;
            let count = page.len();
            streams.extend(page);

            tracing::debug!(
                connection = %self.id,
                page = count,
                total = streams.len(),
                "Fetched stream page"
            );

            if count < self.page_size {
                break;
            }
        }

        Ok(streams)
    }

    async fn stream_info(
        &self,
        stream_id: &StreamId,
    ) -> Result<Option<NativeStreamDescriptor>, ConnectionError> {
        let url = self.endpoint(&["pod", "v2", "streams", stream_id.as_str(), "info"]);
        self.fetch_optional(self.request(Method::GET, url)).await
    }

    async fn stream_members(
        &self,
        stream_id: &StreamId,
    ) -> Result<Vec<NativeUser>, ConnectionError> {
        let Some(info) = self.stream_info(stream_id).await? else {
            return Ok(Vec::new());
        };

        // Room membership is dynamic and lives behind its own endpoint
        let is_room = info.room_attributes.is_some()
            || project(Some(&info)).is_some_and(|record| record.is_room());
        let member_ids = if is_room {
            self.room_member_ids(stream_id).await?
        } else {
            info.stream_attributes
                .map(|chat| chat.members)
                .unwrap_or_default()
        };

        self.users_by_id(&member_ids).await
    }
}
