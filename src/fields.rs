#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Entity {
    User,
    PhotographerProfile,
    Service,
    Session,
    Transaction,
    Review,
    PortfolioItem,
    ServiceArea,
}

const USER: &[(&str, &str)] = &[
    ("id", "id"),
    ("email", "email"),
    ("name", "name"),
    ("role", "role"),
    ("phone", "phone"),
    ("bio", "bio"),
    ("location", "location"),
    ("avatar", "avatar"),
    ("latitude", "latitude"),
    ("longitude", "longitude"),
    ("authId", "auth_id"),
    ("createdAt", "created_at"),
];

const PHOTOGRAPHER_PROFILE: &[(&str, &str)] = &[
    ("id", "id"),
    ("userId", "user_id"),
    ("specialties", "specialties"),
    ("yearsOfExperience", "years_of_experience"),
    ("equipment", "equipment"),
    ("portfolioImages", "portfolio_images"),
    ("availableTimes", "available_times"),
    ("updatedAt", "updated_at"),
];

const SERVICE: &[(&str, &str)] = &[
    ("id", "id"),
    ("photographerId", "photographer_id"),
    ("name", "name"),
    ("description", "description"),
    ("price", "price"),
    ("duration", "duration"),
    ("maxPhotos", "max_photos"),
    ("additionalPhotoPrice", "additional_photo_price"),
    ("active", "active"),
    ("createdAt", "created_at"),
];

const SESSION: &[(&str, &str)] = &[
    ("id", "id"),
    ("title", "title"),
    ("description", "description"),
    ("photographerId", "photographer_id"),
    ("clientId", "client_id"),
    ("serviceId", "service_id"),
    ("date", "date"),
    ("duration", "duration"),
    ("location", "location"),
    ("locationLat", "location_lat"),
    ("locationLng", "location_lng"),
    ("status", "status"),
    ("totalPrice", "total_price"),
    ("photosIncluded", "photos_included"),
    ("photosDelivered", "photos_delivered"),
    ("additionalPhotos", "additional_photos"),
    ("additionalPhotoPrice", "additional_photo_price"),
    ("paymentStatus", "payment_status"),
    ("amountPaid", "amount_paid"),
    ("createdAt", "created_at"),
];

const TRANSACTION: &[(&str, &str)] = &[
    ("id", "id"),
    ("userId", "user_id"),
    ("amount", "amount"),
    ("description", "description"),
    ("category", "category"),
    ("date", "date"),
    ("type", "type"),
    ("sessionId", "session_id"),
    ("createdAt", "created_at"),
];

const REVIEW: &[(&str, &str)] = &[
    ("id", "id"),
    ("sessionId", "session_id"),
    ("clientId", "client_id"),
    ("photographerId", "photographer_id"),
    ("rating", "rating"),
    ("qualityRating", "quality_rating"),
    ("professionalismRating", "professionalism_rating"),
    ("comment", "comment"),
    ("createdAt", "created_at"),
];

const PORTFOLIO_ITEM: &[(&str, &str)] = &[
    ("id", "id"),
    ("userId", "user_id"),
    ("imageUrl", "image_url"),
    ("title", "title"),
    ("description", "description"),
    ("category", "category"),
    ("createdAt", "created_at"),
];

const SERVICE_AREA: &[(&str, &str)] = &[
    ("id", "id"),
    ("userId", "user_id"),
    ("city", "city"),
    ("state", "state"),
    ("country", "country"),
    ("latitude", "latitude"),
    ("longitude", "longitude"),
    ("radiusKm", "radius_km"),
    ("createdAt", "created_at"),
];

impl Entity {
    pub const ALL: [Entity; 8] = [
        Entity::User,
        Entity::PhotographerProfile,
        Entity::Service,
        Entity::Session,
        Entity::Transaction,
        Entity::Review,
        Entity::PortfolioItem,
        Entity::ServiceArea,
    ];

    pub fn table(self) -> &'static str {
        match self {
            Entity::User => "users",
            Entity::PhotographerProfile => "photographer_profiles",
            Entity::Service => "services",
            Entity::Session => "sessions",
            Entity::Transaction => "transactions",
            Entity::Review => "reviews",
            Entity::PortfolioItem => "portfolio_items",
            Entity::ServiceArea => "service_areas",
        }
    }

    /// Singular name used in error messages.
    pub fn name(self) -> &'static str {
        match self {
            Entity::User => "user",
            Entity::PhotographerProfile => "photographer profile",
            Entity::Service => "service",
            Entity::Session => "session",
            Entity::Transaction => "transaction",
            Entity::Review => "review",
            Entity::PortfolioItem => "portfolio item",
            Entity::ServiceArea => "service area",
        }
    }

    pub fn mapping(self) -> &'static [(&'static str, &'static str)] {
        match self {
            Entity::User => USER,
            Entity::PhotographerProfile => PHOTOGRAPHER_PROFILE,
            Entity::Service => SERVICE,
            Entity::Session => SESSION,
            Entity::Transaction => TRANSACTION,
            Entity::Review => REVIEW,
            Entity::PortfolioItem => PORTFOLIO_ITEM,
            Entity::ServiceArea => SERVICE_AREA,
        }
    }

    pub fn column(self, field: &str) -> Option<&'static str> {
        self.mapping()
            .iter()
            .find(|(camel, _)| *camel == field)
            .map(|(_, snake)| *snake)
    }

    pub fn field(self, column: &str) -> Option<&'static str> {
        self.mapping()
            .iter()
            .find(|(_, snake)| *snake == column)
            .map(|(camel, _)| *camel)
    }

    /// Recovers the API field from a Postgres constraint name such as
    /// `sessions_photographer_id_fkey` or `users_email_key`.
    pub fn field_from_constraint(self, constraint: &str) -> Option<&'static str> {
        let rest = constraint.strip_prefix(self.table())?.strip_prefix('_')?;
        let column = ["_fkey", "_key", "_check"]
            .iter()
            .find_map(|suffix| rest.strip_suffix(suffix))
            .unwrap_or(rest);
        self.field(column)
    }
}
