//! HTTP span helpers.

/// Placeholder for path segments that identify a record.
const ID_SEGMENT: &str = "{id}";

#[derive(Debug, Clone)]
pub(super) struct RequestSpanName {
    /// Low-cardinality route, also used as the metrics label.
    pub(super) route: String,
    pub(super) otel_span_name: String,
}

pub(super) fn request_span_name(method: &str, path: &str) -> RequestSpanName {
    let route = normalise_path(path);
    let otel_span_name = format!("{method} {route}");

    RequestSpanName {
        route,
        otel_span_name,
    }
}

fn normalise_path(path: &str) -> String {
    let segments: Vec<&str> = path
        .split('/')
        .filter(|segment| !segment.is_empty())
        .map(|segment| {
            if segment.bytes().all(|byte| byte.is_ascii_digit()) {
                ID_SEGMENT
            } else {
                segment
            }
        })
        .collect();

    format!("/{}", segments.join("/"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn numeric_segments_become_id_placeholders() {
        let names = request_span_name("PUT", "/api/v1/bookings/42/status");

        assert_eq!(names.route, "/api/v1/bookings/{id}/status");
        assert_eq!(names.otel_span_name, "PUT /api/v1/bookings/{id}/status");
    }

    #[test]
    fn named_routes_are_kept() {
        assert_eq!(
            request_span_name("GET", "/api/v1/bookings/me").route,
            "/api/v1/bookings/me"
        );
        assert_eq!(request_span_name("GET", "/").route, "/");
    }
}
