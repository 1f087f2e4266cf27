pub mod mock_asset_server;
