// Repository layer for database operations

pub mod property;
pub mod queries;
pub mod reservation;
pub mod user;

pub use property::PropertyRepository;
pub use reservation::ReservationRepository;
pub use user::UserRepository;
