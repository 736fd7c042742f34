//! Clients for the external collaborators (weather API, SMTP relay) and
//! their scripted test doubles.

pub mod mailer;
pub mod mock_mailer;
pub mod mock_weather;
pub mod weather;
