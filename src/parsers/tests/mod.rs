mod review_parser_tests;
