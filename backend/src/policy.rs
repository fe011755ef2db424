//! Authorization rules for the mutating photo and comment operations.
//!
//! Every rule fails closed: a missing entity, a malformed gallery id or an unmet
//! condition all yield `ApiError::Forbidden`.

use crate::{
    auth::AuthUser,
    error::{ApiError, ApiResult},
    models::{Comment, Photo},
};

/// Gallery id the client sends when no gallery is selected. Never authorizes anything.
pub const SENTINEL_GALLERY_ID: &str = "-1";

/// Parses the gallery id claimed in the path. The sentinel and anything non-numeric
/// are rejected.
pub fn claimed_gallery(raw: &str) -> ApiResult<i64> {
    if raw == SENTINEL_GALLERY_ID {
        return Err(ApiError::Forbidden);
    }
    raw.parse::<i64>().map_err(|_| ApiError::Forbidden)
}

/// authorize_photo_delete
///
/// The caller must be the claimed gallery owner and must own the photo.
pub fn authorize_photo_delete(caller: &AuthUser, gallery_raw: &str, photo: &Photo) -> ApiResult<()> {
    let gallery_id = claimed_gallery(gallery_raw)?;
    if caller.id == gallery_id && photo.user_id == caller.id {
        Ok(())
    } else {
        Err(ApiError::Forbidden)
    }
}

/// authorize_comment_delete
///
/// Allowed for the owner of the photo the comment sits on (who must also be the claimed
/// gallery owner), or for the caller whose username equals the comment's `author`.
/// The sentinel gallery id blocks both branches; a non-numeric id only blocks the owner
/// branch.
///
/// `author` is free text chosen by whoever posted the comment, so the second branch
/// trusts client input.
pub fn authorize_comment_delete(
    caller: &AuthUser,
    gallery_raw: &str,
    comment: &Comment,
    photo: Option<&Photo>,
) -> ApiResult<()> {
    if gallery_raw == SENTINEL_GALLERY_ID {
        return Err(ApiError::Forbidden);
    }

    let is_author = comment.author == caller.username;
    let is_owner = || match (claimed_gallery(gallery_raw), photo) {
        (Ok(gallery_id), Some(p)) => {
            p.id == comment.image_id && p.user_id == caller.id && caller.id == gallery_id
        }
        _ => false,
    };

    if is_author || is_owner() {
        Ok(())
    } else {
        Err(ApiError::Forbidden)
    }
}
