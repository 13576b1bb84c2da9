use std::net::SocketAddr;

/// What an access policy gets to see about an artifact request.
#[derive(Debug, Clone, Copy)]
pub struct AccessRequest<'a> {
    pub method: &'a str,
    /// Artifact path with the endpoint prefix removed.
    pub path: &'a str,
    pub authorization: Option<&'a str>,
    pub remote_addr: Option<SocketAddr>,
}

impl AccessRequest<'_> {
    pub fn is_write(&self) -> bool {
        !matches!(self.method, "GET" | "HEAD")
    }
}

/// Decides whether an artifact request may proceed.
///
/// Credential handling lives behind this trait; the request handler only
/// consumes the yes/no answer and replies 401 on a no.
pub trait AccessPolicy: Send + Sync {
    fn permits(&self, request: &AccessRequest<'_>) -> bool;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct AllowAll;

impl AccessPolicy for AllowAll {
    fn permits(&self, _request: &AccessRequest<'_>) -> bool {
        true
    }
}

impl<F> AccessPolicy for F
where
    F: Fn(&AccessRequest<'_>) -> bool + Send + Sync,
{
    fn permits(&self, request: &AccessRequest<'_>) -> bool {
        self(request)
    }
}
