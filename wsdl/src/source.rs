use std::path::Path;
use url::Url;

use super::error::Error;

/// Turns a URL or a local path into a URL; paths become `file://` URLs.
pub fn locate<S: AsRef<str>>(location: S) -> Result<Url, Error> {
    match Url::parse(location.as_ref()) {
        Ok(url) => Ok(url),

        Err(url::ParseError::RelativeUrlWithoutBase) => {
            let path = Path::new(location.as_ref())
                .canonicalize()
                .map_err(|err| Error::PathConversionError(Some(err)))?;

            Url::from_file_path(&path).map_err(|()| Error::PathConversionError(None))
        }

        Err(err) => Err(err.into()),
    }
}

pub fn fetch(url: &Url) -> Result<String, Error> {
    match url.scheme() {
        "file" => std::fs::read_to_string(
            url.to_file_path()
                .map_err(|()| Error::PathConversionError(None))?,
        )
        .map_err(Error::FileOpenError),

        "http" | "https" => Ok(reqwest::blocking::get(url.clone())?
            .error_for_status()?
            .text()?),

        other => Err(Error::UnsupportedScheme(other.into())),
    }
}
