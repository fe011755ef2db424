/// Router Module Index
///
/// Splits the HTTP surface by access rule. Authentication is applied per module with
/// an axum route layer, so an endpoint cannot end up unprotected by being registered
/// in the wrong place.

/// Routes open to anonymous visitors: session entry points and read-only listings.
pub mod public;

/// Routes behind the `AuthUser` route layer.
pub mod authenticated;

/// Older `/photos` and `/comments` paths, kept for existing clients. Their mutating
/// routes share the authenticated layer and the same ownership policy.
pub mod legacy;
