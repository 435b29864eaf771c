use arrayvec::ArrayVec;
use derive_more::{Display, Error};
use eframe::egui::{ColorImage, Context, TextureHandle, TextureOptions};
use lib::chess::Piece;
use std::{fs, io, path::Path, path::PathBuf};
use tracing::{debug, instrument};

/// The reason why the piece images could not be loaded.
#[derive(Debug, Display, Error)]
pub enum AssetError {
    #[display(fmt = "failed to read `{}`", "_0.display()")]
    Read(PathBuf, #[error(source)] io::Error),

    #[display(fmt = "failed to decode `{}`", "_0.display()")]
    Decode(PathBuf, #[error(source)] image::ImageError),
}

/// The decoded images of all twelve pieces.
pub struct PieceImages(ArrayVec<ColorImage, 12>);

impl PieceImages {
    /// Loads `{color}-{role}.png` for every [`Piece`] from the given directory.
    #[instrument(level = "debug", err)]
    pub fn load(dir: &Path) -> Result<Self, AssetError> {
        let mut images = ArrayVec::new();

        for p in Piece::iter() {
            let path = dir.join(format!("{}-{}.png", p.color(), p.role()));
            let bytes = fs::read(&path).map_err(|e| AssetError::Read(path.clone(), e))?;
            let image = image::load_from_memory(&bytes)
                .map_err(|e| AssetError::Decode(path.clone(), e))?
                .to_rgba8();

            debug!(path = %path.display(), width = image.width(), height = image.height());

            let size = [image.width() as usize, image.height() as usize];
            images.push(ColorImage::from_rgba_unmultiplied(size, image.as_raw()));
        }

        Ok(PieceImages(images))
    }

    /// Uploads the images to the GPU.
    pub fn upload(self, ctx: &Context) -> PieceTextures {
        let textures = Piece::iter()
            .zip(self.0)
            .map(|(p, image)| {
                let name = format!("{}-{}", p.color(), p.role());
                ctx.load_texture(name, image, TextureOptions::LINEAR)
            })
            .collect();

        PieceTextures(textures)
    }
}

/// The textures of all twelve pieces, indexed by [`Piece::index`].
pub struct PieceTextures(ArrayVec<TextureHandle, 12>);

impl PieceTextures {
    /// The texture of a [`Piece`].
    #[inline]
    pub fn get(&self, p: Piece) -> &TextureHandle {
        &self.0[p.index()]
    }
}
