// SPDX-License-Identifier: EUPL-1.2
// Copyright (c) 2026 Benjamin Küttner <benjamin.kuettner@icloud.com>
// Patent Pending — DE Gebrauchsmuster, filed 2026-02-23

pub mod cloner;

pub use cloner::{
    create_voice_cloner, is_audio_content_type, AudioUpload, ClonedAudio, CloneRequest,
    HttpVoiceCloner, MockVoiceCloner, UpstreamError, VoiceCloner,
};
