use axum::{
    Json,
    extract::{Multipart, State},
};
use image::{DynamicImage, GrayImage};
use incubator_core::Line;
use incubator_types::{PageResponse, TextDirection};
use tracing::instrument;

use crate::{
    app::AppResources,
    error::{ApiError, ApiResult},
};

#[derive(Default)]
struct Upload {
    image: Option<DynamicImage>,
    mask: Option<GrayImage>,
    vertical: bool,
}

impl Upload {
    fn image(&mut self) -> ApiResult<DynamicImage> {
        self.image
            .take()
            .ok_or_else(|| ApiError::bad_request("Field \"image\" is required"))
    }
}

async fn read_upload(mut multipart: Multipart) -> ApiResult<Upload> {
    let mut upload = Upload::default();

    while let Some(field) = multipart.next_field().await? {
        let name = field.name().map(|s| s.to_string());
        let data = field.bytes().await?;
        match name.as_deref() {
            Some("image") => upload.image = Some(decode(&data, "image")?),
            Some("mask") => upload.mask = Some(decode(&data, "mask")?.to_luma8()),
            Some("vertical") => upload.vertical = parse_flag(&data)?,
            _ => {}
        }
    }

    Ok(upload)
}

fn decode(data: &[u8], field: &str) -> ApiResult<DynamicImage> {
    image::load_from_memory(data)
        .map_err(|err| ApiError::bad_request(format!("Failed to decode {field}: {err}")))
}

fn parse_flag(data: &[u8]) -> ApiResult<bool> {
    let value = std::str::from_utf8(data)
        .map_err(|_| ApiError::bad_request("Field \"vertical\" is not valid UTF-8"))?
        .trim();
    match value.to_ascii_lowercase().as_str() {
        "" | "false" | "0" => Ok(false),
        "true" | "1" => Ok(true),
        _ => Err(ApiError::bad_request(format!(
            "Field \"vertical\" must be true or false, got {value:?}"
        ))),
    }
}

pub async fn health() -> &'static str {
    "XOXO"
}

/// Recognizes a single line. With a `mask` the line is chunked first.
#[instrument(level = "info", skip_all)]
pub async fn manga_ocr(
    State(resources): State<AppResources>,
    multipart: Multipart,
) -> ApiResult<Json<String>> {
    let mut upload = read_upload(multipart).await?;
    let image = upload.image()?;

    let text = match upload.mask {
        None => resources.pipeline.recognize(&image).await?,
        Some(mask) => {
            let direction = TextDirection::from_vertical(upload.vertical);
            let text_height = resources.pipeline.chunking().text_height;
            let line = Line::fit(image.to_rgb8(), mask, direction, text_height)?;
            resources.pipeline.recognize_line(&line, direction).await?
        }
    };

    tracing::info!(chars = text.chars().count(), "recognized line");
    Ok(Json(text))
}

#[instrument(level = "info", skip_all)]
pub async fn comic_text_detector_manga_ocr(
    State(resources): State<AppResources>,
    multipart: Multipart,
) -> ApiResult<Json<PageResponse>> {
    let mut upload = read_upload(multipart).await?;
    let image = upload.image()?;

    let blocks = resources.pipeline.read_page(&image).await?;
    Ok(Json(PageResponse::from(blocks)))
}
