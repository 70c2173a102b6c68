//! # Wizard Module
//!
//! Screen-to-screen flow of the wizard after a photo has been taken.
//!
//! Each screen reads what it needs from [`SessionStore`]. When the data is
//! missing or unusable the screen does not fail: it returns a [`Redirect`]
//! back to the scan screen together with the notice to show.

use crate::session::SessionStore;
use crate::{ClientError, LookmaxClient};
use lookmax_core::{AnalysisPayload, FaceRating, FaceRecommendation, Notice};
use std::future::Future;
use tracing::{info, warn};

/// Wizard screens, in order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Screen {
    Home,
    Scan,
    Analysis,
    Ratings,
    Recommendations,
}

impl Screen {
    /// Where the back button leads.
    #[must_use]
    pub fn back(self) -> Screen {
        match self {
            Screen::Home | Screen::Scan => Screen::Home,
            Screen::Analysis => Screen::Scan,
            Screen::Ratings => Screen::Analysis,
            Screen::Recommendations => Screen::Ratings,
        }
    }

    /// Position in the progress indicator (the scan screen is dot 0).
    #[must_use]
    pub fn step(self) -> Option<usize> {
        match self {
            Screen::Home => None,
            Screen::Scan => Some(0),
            Screen::Analysis => Some(1),
            Screen::Ratings => Some(2),
            Screen::Recommendations => Some(3),
        }
    }
}

/// Send the user elsewhere and tell them why.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Redirect {
    pub to: Screen,
    pub notice: Notice,
}

impl Redirect {
    fn to_scan(notice: Notice) -> Self {
        Self {
            to: Screen::Scan,
            notice,
        }
    }
}

/// Something that turns an image into an analysis.
pub trait Analyzer {
    fn analyze(
        &self,
        image_data: &str,
    ) -> impl Future<Output = Result<AnalysisPayload, ClientError>> + Send;
}

impl Analyzer for LookmaxClient {
    async fn analyze(&self, image_data: &str) -> Result<AnalysisPayload, ClientError> {
        let record = LookmaxClient::analyze(self, image_data).await?;
        Ok(record.analysis_data)
    }
}

// =============================================================================
// WIZARD
// =============================================================================

/// Drives the result screens of one session.
#[derive(Debug)]
pub struct Wizard<A> {
    analyzer: A,
    session: SessionStore,
    screen: Screen,
}

impl<A: Analyzer> Wizard<A> {
    pub fn new(analyzer: A, session: SessionStore) -> Self {
        Self {
            analyzer,
            session,
            screen: Screen::Home,
        }
    }

    pub fn screen(&self) -> Screen {
        self.screen
    }

    pub fn session(&self) -> &SessionStore {
        &self.session
    }

    /// Leave the home screen for the scan screen.
    pub fn start(&mut self) -> Screen {
        self.screen = Screen::Scan;
        self.screen
    }

    /// Follow the back button.
    pub fn back(&mut self) -> Screen {
        self.screen = self.screen.back();
        self.screen
    }

    fn redirect(&mut self, redirect: Redirect) -> Redirect {
        self.screen = redirect.to;
        redirect
    }

    /// Open the analysis screen.
    ///
    /// The image comes from the URL parameter when it is non-empty, else from
    /// session storage. On success both the image and the payload are written back
    /// to session storage for the following screens.
    pub async fn enter_analysis(
        &mut self,
        url_image: Option<&str>,
    ) -> Result<AnalysisPayload, Redirect> {
        let image = match url_image
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .or_else(|| self.session.captured_image())
        {
            Some(image) if !image.is_empty() => image,
            _ => {
                warn!("analysis screen opened without an image");
                return Err(self.redirect(Redirect::to_scan(Notice::image_not_found())));
            }
        };

        self.screen = Screen::Analysis;
        let payload = match self.analyzer.analyze(&image).await {
            Ok(payload) => payload,
            Err(e) => {
                warn!(error = %e, "analysis failed");
                return Err(self.redirect(Redirect::to_scan(Notice::analysis_failed())));
            }
        };

        if let Err(e) = self.session.set_analysis_data(&payload) {
            warn!(error = %e, "could not store analysis");
            return Err(self.redirect(Redirect::to_scan(Notice::analysis_failed())));
        }
        self.session.set_captured_image(&image);
        info!(features = payload.features.len(), "analysis ready");
        Ok(payload)
    }

    fn stored_analysis(&mut self) -> Result<AnalysisPayload, Redirect> {
        match self.session.analysis_data() {
            Some(Ok(payload)) => Ok(payload),
            Some(Err(e)) => {
                warn!(error = %e, "invalid analysis data in session");
                Err(self.redirect(Redirect::to_scan(Notice::invalid_analysis())))
            }
            None => Err(self.redirect(Redirect::to_scan(Notice::missing_analysis()))),
        }
    }

    /// Open the ratings screen.
    pub fn enter_ratings(&mut self) -> Result<Vec<FaceRating>, Redirect> {
        let payload = self.stored_analysis()?;
        self.screen = Screen::Ratings;
        Ok(payload.ratings)
    }

    /// Open the recommendations screen.
    pub fn enter_recommendations(&mut self) -> Result<Vec<FaceRecommendation>, Redirect> {
        let payload = self.stored_analysis()?;
        self.screen = Screen::Recommendations;
        Ok(payload.recommendations)
    }

    /// Continue from the last screen back home.
    pub fn finish(&mut self) -> Notice {
        self.screen = Screen::Home;
        Notice::analysis_complete()
    }
}

// =============================================================================
// TESTS
// =============================================================================
