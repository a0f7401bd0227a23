use mockito::Matcher;
use wreckage_test_utils::{fixtures::eve::mockito as mocks, prelude::*};

use super::{test_client, EsiError};

mod get {
    use super::*;

    /// Expect a 200 response to decode into the ESI model with cache headers exposed
    #[tokio::test]
    async fn decodes_success_body() -> Result<(), TestError> {
        let test = TestBuilder::new()
            .with_json_endpoint(
                &mocks::alliance_path(99000001),
                data::alliance("Wreckage Alliance"),
                1,
            )
            .build()
            .await?;
        let esi = test_client(&test.server_url());

        let response = esi.get_alliance(99000001, None).await;

        assert!(response.meta.is_ok());
        assert_eq!(response.meta.etag().as_deref(), Some("\"fixture-etag\""));
        assert_eq!(
            response.meta.expires().to_rfc3339(),
            "2024-09-14T11:05:00+00:00"
        );
        let alliance = response.data.unwrap();
        assert_eq!(alliance.name, "Wreckage Alliance");
        test.assert_mocks();

        Ok(())
    }

    /// Expect the stored etag to be sent and a 304 to be a success without body
    #[tokio::test]
    async fn conditional_request_not_modified() -> Result<(), TestError> {
        let mut test = TestBuilder::new().build().await?;
        let mock = test
            .server
            .mock("GET", mocks::alliance_path(99000001).as_str())
            .match_header("if-none-match", "\"stored-etag\"")
            .with_status(304)
            .expect(1);
        test.add_mock(mock).await;
        let esi = test_client(&test.server_url());

        let response = esi.get_alliance(99000001, Some("\"stored-etag\"")).await;

        assert!(response.meta.is_not_modified());
        assert!(response.meta.error.is_none());
        assert!(response.data.is_none());
        test.assert_mocks();

        Ok(())
    }

    /// Expect server errors to be retried up to the attempt ceiling
    #[tokio::test]
    async fn server_error_retried_until_max_attempts() -> Result<(), TestError> {
        let test = TestBuilder::new()
            .with_status_endpoint(&mocks::alliance_path(99000001), 502, 3)
            .build()
            .await?;
        let esi = test_client(&test.server_url());

        let response = esi.get_alliance(99000001, None).await;

        assert!(matches!(
            response.meta.error,
            Some(EsiError::MaxAttempts {
                attempts: 3,
                code: 502,
                ..
            })
        ));
        test.assert_mocks();

        Ok(())
    }

    /// Expect client errors to return without retrying
    #[tokio::test]
    async fn client_error_not_retried() -> Result<(), TestError> {
        let test = TestBuilder::new()
            .with_status_endpoint(&mocks::alliance_path(99000001), 404, 1)
            .build()
            .await?;
        let esi = test_client(&test.server_url());

        let response = esi.get_alliance(99000001, None).await;

        assert!(response.meta.is_not_found());
        assert!(matches!(
            response.meta.error,
            Some(EsiError::Status { code: 404, .. })
        ));
        test.assert_mocks();

        Ok(())
    }

    /// Expect a 422 to surface as unprocessable
    #[tokio::test]
    async fn unprocessable_killmail() -> Result<(), TestError> {
        let test = TestBuilder::new()
            .with_status_endpoint(&mocks::killmail_path(1, "bad"), 422, 1)
            .build()
            .await?;
        let esi = test_client(&test.server_url());

        let response = esi.get_killmail(1, "bad").await;

        assert!(response.meta.is_unprocessable());
        assert!(matches!(
            response.into_result(),
            Err(EsiError::Unprocessable { .. })
        ));
        test.assert_mocks();

        Ok(())
    }

    /// Expect a body that does not match the model to fail decoding
    #[tokio::test]
    async fn malformed_body_fails_decode() -> Result<(), TestError> {
        let test = TestBuilder::new()
            .with_json_endpoint(
                &mocks::alliance_path(99000001),
                serde_json::json!({ "unexpected": true }),
                1,
            )
            .build()
            .await?;
        let esi = test_client(&test.server_url());

        let response = esi.get_alliance(99000001, None).await;

        assert!(matches!(response.meta.error, Some(EsiError::Decode { .. })));

        Ok(())
    }
}

mod tracker {
    use super::*;

    /// Expect error limit headers to update the shared budget
    #[tokio::test]
    async fn headers_update_budget() -> Result<(), TestError> {
        let mut test = TestBuilder::new().build().await?;
        let mock = test
            .server
            .mock("GET", mocks::alliance_path(99000001).as_str())
            .with_status(404)
            .with_header("x-esi-error-limit-remain", "15")
            .with_header("x-esi-error-limit-reset", "30")
            .expect(1);
        test.add_mock(mock).await;
        let esi = test_client(&test.server_url());

        esi.get_alliance(99000001, None).await;

        assert_eq!(esi.tracker().remain(), 15);
        assert!(esi.tracker().watchman());
        assert_eq!(esi.tracker().summary().client_error, 1);

        Ok(())
    }

    /// Expect no request to be sent while the budget is exhausted
    #[tokio::test]
    async fn exhausted_budget_withholds_request() -> Result<(), TestError> {
        let mut test = TestBuilder::new().build().await?;
        let mock = test
            .server
            .mock("GET", Matcher::Any)
            .with_status(200)
            .expect(0);
        test.add_mock(mock).await;
        let esi = test_client(&test.server_url());
        esi.tracker().update_budget(5, 60);

        let response = esi.get_alliance(99000001, None).await;

        assert!(matches!(
            response.meta.error,
            Some(EsiError::Throttled { .. })
        ));
        test.assert_mocks();

        Ok(())
    }

    /// Expect a 420 to mark the budget as spent
    #[tokio::test]
    async fn error_limited_response_blocks_followups() -> Result<(), TestError> {
        let test = TestBuilder::new()
            .with_status_endpoint(&mocks::alliance_path(99000001), 420, 1)
            .build()
            .await?;
        let esi = test_client(&test.server_url());

        esi.get_alliance(99000001, None).await;
        let followup = esi.get_alliance(99000001, None).await;

        assert!(!esi.tracker().watchman());
        assert!(matches!(
            followup.meta.error,
            Some(EsiError::Throttled { .. })
        ));
        test.assert_mocks();

        Ok(())
    }
}
