use std::{fmt, str::FromStr};

use axum::routing::{MethodFilter, MethodRouter, on};

use crate::{app::AppResources, endpoints};

/// Every HTTP route the server answers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Route {
    Health,
    MangaOcr,
    ComicTextDetectorMangaOcr,
}

impl Route {
    pub const ALL: &[Route] = &[
        Route::Health,
        Route::MangaOcr,
        Route::ComicTextDetectorMangaOcr,
    ];

    pub fn path(self) -> &'static str {
        match self {
            Route::Health => "/",
            Route::MangaOcr => "/magic/manga-ocr",
            Route::ComicTextDetectorMangaOcr => "/magic/comic-text-detector+manga-ocr",
        }
    }

    pub fn method(self) -> MethodFilter {
        match self {
            Route::Health => MethodFilter::GET,
            Route::MangaOcr | Route::ComicTextDetectorMangaOcr => MethodFilter::POST,
        }
    }

    pub fn handler(self) -> MethodRouter<AppResources> {
        let method = self.method();
        match self {
            Route::Health => on(method, endpoints::health),
            Route::MangaOcr => on(method, endpoints::manga_ocr),
            Route::ComicTextDetectorMangaOcr => {
                on(method, endpoints::comic_text_detector_manga_ocr)
            }
        }
    }
}

impl fmt::Display for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.path())
    }
}

impl FromStr for Route {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Route::ALL
            .iter()
            .copied()
            .find(|route| route.path() == s)
            .ok_or_else(|| anyhow::anyhow!("unknown route: {s}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn paths_round_trip() {
        for route in Route::ALL {
            let parsed: Route = route.to_string().parse().unwrap();
            assert_eq!(parsed, *route);
        }
    }

    #[test]
    fn unknown_path_is_rejected() {
        assert!("/magic/unknown".parse::<Route>().is_err());
    }

    #[test]
    fn only_health_is_a_get() {
        let gets: Vec<_> = Route::ALL
            .iter()
            .filter(|route| route.method() == MethodFilter::GET)
            .collect();
        assert_eq!(gets, [&Route::Health]);
    }
}
