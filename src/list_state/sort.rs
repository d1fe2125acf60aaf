use std::fmt;

/// A closed set of sort options for one listing.
///
/// Each option has a token used in the page URL and an ordering token sent to
/// the server. The [`Default`] option is never written to the URL.
pub trait SortKey: Copy + Eq + Default + fmt::Debug + Send + Sync + 'static {
    /// Every option, in display order.
    fn all() -> &'static [Self];

    /// Token used in the `sort` URL parameter.
    fn token(self) -> &'static str;

    /// Token used in the server `ordering` parameter.
    fn ordering(self) -> &'static str;

    fn from_token(token: &str) -> Option<Self> {
        Self::all().iter().copied().find(|key| key.token() == token)
    }
}

/// Sort options of the pet listing.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum PetSort {
    #[default]
    Newest,
    Oldest,
    PriceLow,
    PriceHigh,
    Name,
}

impl PetSort {
    /// Label shown in a sort picker.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Newest => "Newest First",
            Self::Oldest => "Oldest First",
            Self::PriceLow => "Price: Low to High",
            Self::PriceHigh => "Price: High to Low",
            Self::Name => "Name: A to Z",
        }
    }
}

impl SortKey for PetSort {
    fn all() -> &'static [Self] {
        &[
            Self::Newest,
            Self::Oldest,
            Self::PriceLow,
            Self::PriceHigh,
            Self::Name,
        ]
    }

    fn token(self) -> &'static str {
        match self {
            Self::Newest => "newest",
            Self::Oldest => "oldest",
            Self::PriceLow => "price-low",
            Self::PriceHigh => "price-high",
            Self::Name => "name",
        }
    }

    fn ordering(self) -> &'static str {
        match self {
            Self::Newest => "-created_at",
            Self::Oldest => "created_at",
            Self::PriceLow => "price",
            Self::PriceHigh => "-price",
            Self::Name => "name",
        }
    }
}

impl fmt::Display for PetSort {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.token())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tokens_round_trip() {
        for key in PetSort::all() {
            assert_eq!(PetSort::from_token(key.token()), Some(*key));
        }
        assert_eq!(PetSort::from_token("cheapest"), None);
    }

    #[test]
    fn test_orderings() {
        assert_eq!(PetSort::default().ordering(), "-created_at");
        assert_eq!(PetSort::PriceLow.ordering(), "price");
        assert_eq!(PetSort::PriceHigh.ordering(), "-price");
    }
}
