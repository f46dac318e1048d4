use http::Method;
use std::collections::HashMap;

#[derive(Debug)]
enum PathSegment {
    Static(String),
    Param(String),
}

#[derive(Debug)]
struct Path {
    segments: Vec<PathSegment>,
}

impl Path {
    /// Parses a path pattern string into a Path struct
    /// Supports:
    /// - Static segments: "/v1/tenants"
    /// - Dynamic parameters: "/v1/versions/{service}"
    pub fn parse(path_str: &str) -> Self {
        let normalized_path = path_str.trim().trim_matches('/');

        let segments: Vec<PathSegment> = if normalized_path.is_empty() {
            vec![]
        } else {
            normalized_path
                .split('/')
                .map(|s| {
                    if let Some(stripped) = s.strip_prefix('{').and_then(|s| s.strip_suffix('}')) {
                        PathSegment::Param(stripped.to_string())
                    } else {
                        PathSegment::Static(s.to_string())
                    }
                })
                .collect()
        };

        Path { segments }
    }

    /// Matches a request path against this path pattern
    /// Returns Some(params) if match succeeds, None otherwise
    fn matches<'a>(&self, request_path: &'a str) -> Option<HashMap<String, &'a str>> {
        let normalized_path = request_path.trim().trim_matches('/');

        let request_segments: Vec<&'a str> = if normalized_path.is_empty() {
            vec![]
        } else {
            normalized_path.split('/').collect()
        };

        if request_segments.len() != self.segments.len() {
            return None;
        }

        let mut params = HashMap::new();
        for (seg, req_segment) in self.segments.iter().zip(request_segments) {
            match seg {
                PathSegment::Static(s) => {
                    if req_segment != s {
                        return None;
                    }
                }
                PathSegment::Param(name) => {
                    // An empty parameter ("/v1/versions//") never matches
                    if req_segment.is_empty() {
                        return None;
                    }
                    params.insert(name.clone(), req_segment);
                }
            }
        }

        Some(params)
    }
}

#[derive(Debug, PartialEq)]
pub struct RouteMatch<'a, A> {
    pub params: HashMap<String, &'a str>,
    pub action: &'a A,
}

impl<A> RouteMatch<'_, A> {
    /// Returns the value captured for a `{name}` segment.
    pub fn param(&self, name: &str) -> Option<&str> {
        self.params.get(name).copied()
    }
}

/// Outcome of resolving a request against the route table.
#[derive(Debug, PartialEq)]
pub enum Resolution<'a, A> {
    Matched(RouteMatch<'a, A>),
    /// The path is known but no route accepts this method.
    MethodNotAllowed,
    NotFound,
}

#[derive(Debug)]
pub struct Route<A> {
    method: Method,
    path: Path,
    action: A,
}

impl<A> Route<A> {
    /// Creates a new Route with the given method, path pattern and action
    pub fn new(method: Method, path: &str, action: A) -> Self {
        Self {
            method,
            path: Path::parse(path),
            action,
        }
    }

    /// Returns Some(RouteMatch) if both method and path match, None otherwise.
    /// Trailing slash normalization is applied to incoming requests.
    pub fn matches<'a>(
        &'a self,
        request_method: &Method,
        request_path: &'a str,
    ) -> Option<RouteMatch<'a, A>> {
        if &self.method != request_method {
            return None;
        }

        let params = self.path.matches(request_path)?;
        Some(RouteMatch {
            params,
            action: &self.action,
        })
    }
}

pub struct RouteActions<A> {
    routes: Vec<Route<A>>,
}

impl<A> RouteActions<A> {
    pub fn new(routes: Vec<Route<A>>) -> Self {
        Self { routes }
    }

    /// Matches the incoming request to a route and returns the first matched route.
    pub fn resolve<'a, B>(&'a self, request: &'a http::Request<B>) -> Resolution<'a, A> {
        self.resolve_parts(request.method(), request.uri().path())
    }

    pub fn resolve_parts<'a>(&'a self, method: &Method, path: &'a str) -> Resolution<'a, A> {
        if let Some(found) = self
            .routes
            .iter()
            .find_map(|route| route.matches(method, path))
        {
            return Resolution::Matched(found);
        }

        if self
            .routes
            .iter()
            .any(|route| route.path.matches(path).is_some())
        {
            Resolution::MethodNotAllowed
        } else {
            Resolution::NotFound
        }
    }
}
