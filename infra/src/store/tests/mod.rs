mod cached_store_tests;
