//! Stored image bytes behind avatars and recipe pictures.

use diesel::prelude::*;
use uuid::Uuid;

use crate::error::{ApiError, FieldErrors};
use crate::images::{decode_image_payload, DecodedImage};
use crate::models::NewPhoto;
use crate::schema::photos;

/// Decode an image payload, reporting problems against `field`.
pub fn decode_field(field: &str, payload: &str) -> Result<DecodedImage, ApiError> {
    decode_image_payload(payload).map_err(|e| ApiError::Validation(FieldErrors::single(field, e)))
}

pub fn store_photo(conn: &mut PgConnection, user_id: i64, image: &DecodedImage) -> QueryResult<Uuid> {
    diesel::insert_into(photos::table)
        .values(&NewPhoto {
            user_id,
            content_type: &image.content_type,
            data: &image.data,
        })
        .returning(photos::id)
        .get_result(conn)
}

pub fn delete_photo(conn: &mut PgConnection, photo_id: Uuid) -> QueryResult<usize> {
    diesel::delete(photos::table.find(photo_id)).execute(conn)
}
