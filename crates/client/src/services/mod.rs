//! Domain services: one per backend resource.
//!
//! Each service maps endpoints onto typed requests and responses and nothing
//! more. Caching of the cart and user notices live in [`crate::cart`];
//! services only report [`ApiError`](crate::api::ApiError)s.

mod account;
mod cart;
mod orders;
mod products;

pub use account::AccountService;
pub use cart::CartService;
pub use orders::{OrderQuery, OrderService};
pub use products::{ProductQuery, ProductService};

/// Sort direction understood by the backend's paged endpoints.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum SortDirection {
    Asc,
    #[default]
    Desc,
}

impl SortDirection {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Asc => "asc",
            Self::Desc => "desc",
        }
    }
}

impl std::str::FromStr for SortDirection {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "asc" => Ok(Self::Asc),
            "desc" => Ok(Self::Desc),
            _ => Err(format!("invalid sort direction: {s}")),
        }
    }
}
