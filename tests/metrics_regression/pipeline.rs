//! Pipeline board metrics regression tests

use super::helpers::*;
use crm_api::pipeline::{BoardConfig, Lead, LeadStatus};
use crm_api::ApiClient;
use crm_api_executor::TransportResponse;
use crm_api_tests::ScriptedTransport;
use serial_test::serial;

#[tokio::test]
#[serial]
async fn board_metrics_exist() {
    init_recorder();

    let transport = ScriptedTransport::new(|req, _| {
        if req.url.ends_with("/2/") {
            Ok(TransportResponse::new(400, "Bad Request", ""))
        } else {
            Ok(TransportResponse::ok("{}"))
        }
    });
    let board = ApiClient::builder()
        .build_with_transport(transport)
        .unwrap()
        .board_with(
            BoardConfig::builder()
                .name("metrics_board")
                .leads(vec![
                    Lead::new(1, LeadStatus::New),
                    Lead::new(2, LeadStatus::New),
                    Lead::new(3, LeadStatus::Lost),
                ]),
        );

    board.move_lead(1, LeadStatus::Contacted).await;
    board.move_lead(2, LeadStatus::Contacted).await;
    board.move_lead(3, LeadStatus::New).await;

    assert_counter_exists("crm_api_board_moves_total");
    assert_metric_has_label("crm_api_board_moves_total", "board", "metrics_board");
    assert_metric_has_label("crm_api_board_moves_total", "result", "confirmed");
    assert_metric_has_label("crm_api_board_moves_total", "result", "rolled_back");
    assert_metric_has_label("crm_api_board_moves_total", "result", "rejected");
}
