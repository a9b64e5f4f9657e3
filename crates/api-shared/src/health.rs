use crate::dto::HealthRes;

/// Simple health service shared by API surfaces.
///
/// This service provides a standardised way to check the health status of the
/// workstation API. It can be used both as a static utility and as an
/// instantiated service.
#[derive(Clone)]
pub struct HealthService;

impl HealthService {
    /// Creates a new instance of HealthService.
    pub fn new() -> Self {
        Self
    }

    /// Static method to check health without creating an instance.
    ///
    /// This is the preferred method for health checks as it doesn't require
    /// instantiating the service.
    pub fn check_health() -> HealthRes {
        HealthRes {
            ok: true,
            message: "EDW API is alive".into(),
        }
    }

    /// Instance method for compatibility; delegates to [`Self::check_health`].
    pub fn check_health_instance(&self) -> HealthRes {
        Self::check_health()
    }
}

impl Default for HealthService {
    fn default() -> Self {
        Self::new()
    }
}
