pub mod crawler;
pub mod renderer;
pub mod web;


pub use crawler::{AgentRotation, Crawler};
pub use renderer::{BrowserLauncher, PageRenderer, RenderedPage};
pub use web::WebDriverLauncher;
