// Copyright (c) 2025 SCTG Development
// This file is part of the rust-scale-gateway project and is licensed under the
// SCTG Development Non-Commercial License v1.0 (see LICENSE.md for details).

//! Rocket server assembly for the visualization component

use rocket::fairing::{Fairing, Info, Kind};
use rocket::figment::Figment;
use rocket::http::Header;
use rocket::{options, routes, Build, Rocket};
use rocket::{Request, Response};
use std::path::PathBuf;
use std::sync::Arc;

use super::api::{self, ScaleStreamState};
use crate::acquisition::SharedScaleStream;

pub struct CORS;

#[rocket::async_trait]
impl Fairing for CORS {
    fn info(&self) -> Info {
        Info {
            name: "Add CORS headers to responses",
            kind: Kind::Response,
        }
    }

    async fn on_response<'r>(&self, _request: &'r Request<'_>, response: &mut Response<'r>) {
        response.set_header(Header::new("Access-Control-Allow-Origin", "*"));
        response.set_header(Header::new(
            "Access-Control-Allow-Methods",
            "GET, OPTIONS",
        ));
        response.set_header(Header::new("Access-Control-Allow-Headers", "*"));
    }
}

/// Answers to OPTIONS requests
#[options("/<_path..>")]
async fn options(_path: PathBuf) -> Result<(), std::io::Error> {
    Ok(())
}

/// Assemble the Rocket instance serving the scale API.
///
/// The returned instance is not yet ignited; the caller decides when and on
/// which runtime to launch it.
pub async fn build_rocket(figment: Figment, stream: Arc<SharedScaleStream>) -> Rocket<Build> {
    rocket::custom(figment)
        .attach(CORS)
        .mount("/", routes![options, api::get_scale, api::stream_scale])
        .manage(ScaleStreamState { stream })
}
