// ABOUTME: Core types and validation for the Compass catalog
// ABOUTME: Foundational package shared by the storage and API layers

pub mod slug;
pub mod types;
pub mod validator;

// Re-export main types
pub use types::{
    double_option, Category, CategoryCreateInput, CategoryUpdateInput, PasswordUpdateInput,
    RadarData, RadarEntry, RadarStatus, Rating, RatingInput, RatingSummary, RecommendStatus,
    Solution, SolutionCreateInput, SolutionUpdateInput, Stage, Tag, TagCreateInput,
    TagUpdateInput, User, UserCreateInput, UserRecord, UserUpdateInput, UNCLASSIFIED_QUADRANT,
};

// Re-export slug generation
pub use slug::generate_slug;

// Re-export validation
pub use validator::{
    is_valid_email, validate_category_create, validate_category_update, validate_rating,
    validate_solution_create, validate_solution_update, validate_tag_create, validate_tag_update,
    validate_user_create, validate_user_update, ValidationError, MAX_QUADRANT,
};
