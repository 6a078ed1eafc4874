use super::*;
use crate::downloader::test_helpers::{
    MockExtractor, MockOutcome, create_test_downloader, create_test_downloader_with,
    wait_for_task, wait_for_terminal,
};
use crate::types::{DownloadRequest, TaskStatus};


fn request(url: &str, quality: Option<&str>, title: Option<&str>) -> DownloadRequest {
    DownloadRequest {
        url: url.to_string(),
        quality: quality.map(str::to_string),
        title: title.map(str::to_string),
    }
}
